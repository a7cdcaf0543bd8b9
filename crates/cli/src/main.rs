use clap::Parser;
use openapi_gen::{Cli, logging, run};
use tracing::error;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(run(cli)) {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
}
