//! Small TypeScript syntax pieces shared by the back-ends.

/// Trait for emitting TypeScript code from syntax nodes.
pub trait Emit {
    fn emit(&self) -> String;
}

/// What an import statement binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import * as Alias from "..."`
    Namespace(String),
    /// `import { A, B as C } from "..."`
    Named(Vec<ImportItem>),
}

/// Import item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsImport {
    pub binding: ImportBinding,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

impl TsImport {
    pub fn namespace(alias: &str, from: &str) -> Self {
        Self {
            binding: ImportBinding::Namespace(alias.to_string()),
            from: from.to_string(),
            type_only: false,
        }
    }

    pub fn named(names: &[&str], from: &str) -> Self {
        Self {
            binding: ImportBinding::Named(
                names
                    .iter()
                    .map(|name| ImportItem {
                        name: (*name).to_string(),
                        alias: None,
                    })
                    .collect(),
            ),
            from: from.to_string(),
            type_only: false,
        }
    }

    pub fn type_only(mut self) -> Self {
        self.type_only = true;
        self
    }
}

impl Emit for ImportItem {
    fn emit(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        match &self.binding {
            ImportBinding::Namespace(alias) => {
                format!("import {type_keyword}* as {alias} from \"{}\"", self.from)
            }
            ImportBinding::Named(items) => {
                let items_str = items.iter().map(Emit::emit).collect::<Vec<_>>().join(", ");
                format!("import {type_keyword}{{ {items_str} }} from \"{}\"", self.from)
            }
        }
    }
}

impl Emit for [TsImport] {
    fn emit(&self) -> String {
        self.iter().map(Emit::emit).collect::<Vec<_>>().join("\n")
    }
}

/// Indents every non-empty line by `width` spaces.
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_named_import() {
        let import = TsImport::named(&["Data", "Effect"], "effect");
        assert_eq!(import.emit(), "import { Data, Effect } from \"effect\"");
    }

    #[test]
    fn test_emit_type_import() {
        let import = TsImport::named(&["ParseError"], "effect/ParseResult").type_only();
        assert_eq!(
            import.emit(),
            "import type { ParseError } from \"effect/ParseResult\""
        );
    }

    #[test]
    fn test_emit_namespace_import() {
        let import = TsImport::namespace("S", "effect/Schema");
        assert_eq!(import.emit(), "import * as S from \"effect/Schema\"");
    }

    #[test]
    fn test_emit_aliased_item() {
        let item = ImportItem {
            name: "Schema".into(),
            alias: Some("S".into()),
        };
        assert_eq!(item.emit(), "Schema as S");
    }

    #[test]
    fn test_emit_import_list() {
        let imports = vec![
            TsImport::namespace("S", "effect/Schema"),
            TsImport::named(&["Effect"], "effect"),
        ];
        assert_eq!(
            imports.as_slice().emit(),
            "import * as S from \"effect/Schema\"\nimport { Effect } from \"effect\""
        );
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("a\n\nb", 2), "  a\n\n  b");
    }
}
