#![allow(clippy::unwrap_used, clippy::expect_used)]

use openapi_gen_core::{Flavor, GenerateOptions, generate};
use serde_json::{Value, json};

fn petstore() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "Petstore", "version": "1.0.0" },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "summary": "List all pets",
                    "parameters": [
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "maximum": 100 } }
                    ],
                    "responses": {
                        "200": {
                            "description": "A list of pets",
                            "content": { "application/json": { "schema": {
                                "type": "array", "items": { "$ref": "#/components/schemas/Pet" }
                            } } }
                        }
                    }
                },
                "post": {
                    "operationId": "createPet",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NewPet" } } }
                    },
                    "responses": { "201": { "description": "Created" } }
                }
            },
            "/pets/{petId}": {
                "get": {
                    "operationId": "getPet",
                    "parameters": [
                        { "name": "petId", "in": "path", "required": true, "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": {
                            "description": "A pet",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                        },
                        "404": {
                            "description": "Not found",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ApiError" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "status": { "type": "string", "enum": ["available", "sold"] },
                        "tag": { "type": ["string", "null"] }
                    }
                },
                "NewPet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string", "minLength": 1 } }
                },
                "ApiError": {
                    "type": "object",
                    "required": ["message"],
                    "properties": { "message": { "type": "string" } }
                }
            }
        }
    })
}

fn options(flavor: Flavor) -> GenerateOptions {
    GenerateOptions {
        name: "Client".to_string(),
        flavor,
    }
}

#[test]
fn test_schema_flavor_declarations() {
    let out = generate(&petstore(), &options(Flavor::Schema));

    assert!(out.starts_with("import type * as HttpClient from \"@effect/platform/HttpClient\""));
    assert!(out.contains("export class PetStatus extends S.Literal(\"available\", \"sold\") {}"));
    assert!(out.contains(
        "export class Pet extends S.Struct({\n  \"id\": S.String,\n  \"name\": S.String,\n  \"status\": S.optionalWith(PetStatus, { nullable: true }),\n  \"tag\": S.optionalWith(S.String, { nullable: true })\n}) {}"
    ));
    assert!(out.contains("export class ListPets200 extends S.Array(Pet) {}"));
    assert!(out.contains(
        "export class NewPet extends S.Class<NewPet>(\"NewPet\")({\n  \"name\": S.String.pipe(S.minLength(1))\n}) {}"
    ));
    assert!(out.contains(
        "\"limit\": S.optionalWith(S.Int.pipe(S.lessThanOrEqualTo(100)), { nullable: true })"
    ));
}

#[test]
fn test_schema_flavor_client() {
    let out = generate(&petstore(), &options(Flavor::Schema));

    assert!(out.contains("export const make = (\n  httpClient: HttpClient.HttpClient,"));
    assert!(out.contains("HttpClientRequest.make(\"GET\")(`/pets/${petId}`).pipe("));
    assert!(out.contains("\"404\": decodeError(\"ApiError\", ApiError),"));
    assert!(out.contains("HttpClientRequest.bodyUnsafeJson(options),"));
    assert!(out.contains("\"201\": decodeVoid,"));
    assert!(out.contains(
        "  /**\n  * List all pets\n  */\n  readonly \"listPets\": (options?: typeof ListPetsParams.Encoded | undefined) => Effect.Effect<typeof ListPets200.Type, HttpClientError.HttpClientError | ParseError>"
    ));
    assert!(out.contains(
        "readonly \"getPet\": (petId: string) => Effect.Effect<typeof Pet.Type, HttpClientError.HttpClientError | ParseError | ClientError<\"ApiError\", typeof ApiError.Type>>"
    ));
    assert!(out.contains(
        "readonly \"createPet\": (options: typeof NewPet.Encoded) => Effect.Effect<void, HttpClientError.HttpClientError | ParseError>"
    ));
    assert!(out.contains("export interface ClientError<Tag extends string, E>"));
}

#[test]
fn test_type_only_flavor() {
    let out = generate(&petstore(), &options(Flavor::TypeOnly));

    assert!(!out.contains("effect/Schema"));
    assert!(out.contains("export type PetStatus = \"available\" | \"sold\""));
    assert!(out.contains(
        "export interface Pet {\n  readonly \"id\": string\n  readonly \"name\": string\n  readonly \"status\"?: PetStatus | undefined\n  readonly \"tag\"?: string | null | undefined\n}"
    ));
    assert!(out.contains("export type ListPets200 = ReadonlyArray<Pet>"));
    assert!(out.contains("readonly \"getPet\": (petId: string) => Effect.Effect<Pet"));
    assert!(out.contains("\"200\": decodeSuccess,"));
    assert!(out.contains("\"404\": decodeError(\"ApiError\"),"));
}

#[test]
fn test_dependencies_declared_before_use() {
    let out = generate(&petstore(), &options(Flavor::Schema));
    let position = |needle: &str| out.find(needle).unwrap();
    assert!(position("export class PetStatus ") < position("export class Pet "));
    assert!(position("export class Pet ") < position("export class ListPets200 "));
    assert!(position("export class ListPets200 ") < position("export const make"));
    assert!(position("export const make") < position("export interface Client "));
}

#[test]
fn test_output_is_deterministic() {
    let document = petstore();
    for flavor in [Flavor::Schema, Flavor::TypeOnly] {
        let first = generate(&document, &options(flavor));
        let second = generate(&document, &options(flavor));
        assert_eq!(first, second);
    }
}

#[test]
fn test_client_name_is_used() {
    let out = generate(
        &petstore(),
        &GenerateOptions {
            name: "PetStore".to_string(),
            flavor: Flavor::Schema,
        },
    );
    assert!(out.contains("): PetStore => {"));
    assert!(out.contains("export interface PetStore {"));
    assert!(out.contains("Effect.fail(PetStoreError(tag, cause, response))"));
    assert!(out.contains("PetStoreError<\"ApiError\", typeof ApiError.Type>"));
}

#[test]
fn test_empty_document() {
    let out = generate(&json!({ "openapi": "3.1.0" }), &GenerateOptions::default());
    assert!(out.contains("export const make = ("));
    assert!(out.contains("export interface Client {\n  readonly httpClient: HttpClient.HttpClient\n}"));
    assert!(out.ends_with('\n'));
}

#[test]
fn test_best_effort_on_broken_references() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/things": {
                "get": {
                    "operationId": "listThings",
                    "responses": {
                        "200": {
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": {
                                    "missing": { "$ref": "#/components/schemas/Missing" },
                                    "external": { "$ref": "other.yaml#/Thing" },
                                    "ok": { "type": "boolean" }
                                }
                            } } }
                        }
                    }
                }
            }
        }
    });
    let out = generate(&document, &options(Flavor::TypeOnly));
    assert!(out.contains("export interface ListThings200 {\n  readonly \"ok\"?: boolean | undefined\n}"));
    assert!(!out.contains("Missing"));
}

#[test]
fn test_all_of_and_nullable_union() {
    let document = json!({
        "openapi": "3.1.0",
        "paths": {
            "/dogs": {
                "get": {
                    "operationId": "getDog",
                    "responses": {
                        "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Dog" } } } }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Animal": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                },
                "Dog": {
                    "allOf": [
                        { "$ref": "#/components/schemas/Animal" },
                        {
                            "type": "object",
                            "required": ["owner"],
                            "properties": {
                                "owner": { "anyOf": [{ "type": "string" }, { "type": "null" }] }
                            }
                        }
                    ]
                }
            }
        }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains(
        "export class Dog extends S.Class<Dog>(\"Dog\")({\n  \"name\": S.String,\n  \"owner\": S.NullOr(S.String)\n}) {}"
    ));
    assert!(!out.contains("export class Animal"));
}

#[test]
fn test_get_pet_scenario() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/pets/{id}": {
                "get": {
                    "operationId": "getPet",
                    "parameters": [{ "name": "id", "in": "path", "required": true }],
                    "responses": {
                        "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } } }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "string" },
                        "name": { "type": "string" },
                        "age": { "type": "integer" }
                    }
                }
            }
        }
    });
    let out = generate(&document, &options(Flavor::TypeOnly));
    assert!(out.contains(
        "export interface Pet {\n  readonly \"id\": string\n  readonly \"name\": string\n  readonly \"age\"?: number | undefined\n}"
    ));
    assert!(out.contains(
        "readonly \"getPet\": (id: string) => Effect.Effect<Pet, HttpClientError.HttpClientError>"
    ));
    assert!(out.contains("\"getPet\": (id) =>\n"));
    assert!(out.contains("HttpClientRequest.make(\"GET\")(`/pets/${id}`)"));
}

#[test]
fn test_form_data_payloads() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/uploads": {
                "post": {
                    "operationId": "uploadFile",
                    "requestBody": { "content": { "multipart/form-data": { "schema": {
                        "type": "object",
                        "required": ["file"],
                        "properties": {
                            "file": { "type": "string", "format": "binary" },
                            "note": { "type": "string" }
                        }
                    } } } },
                    "responses": { "204": { "description": "Stored" } }
                }
            },
            "/raw": {
                "post": {
                    "operationId": "uploadRaw",
                    "requestBody": { "content": { "multipart/form-data": {} } },
                    "responses": { "204": { "description": "Stored" } }
                }
            }
        }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains(
        "export class UploadFileRequestFormData extends S.Struct({\n  \"file\": S.instanceOf(globalThis.Blob),\n  \"note\": S.optionalWith(S.String, { nullable: true })\n}) {}"
    ));
    assert!(out.contains("HttpClientRequest.bodyFormDataRecord(options as any),"));
    assert!(out.contains(
        "readonly \"uploadFile\": (options: typeof UploadFileRequestFormData.Encoded) => Effect.Effect<void, "
    ));
    assert!(out.contains("HttpClientRequest.bodyFormData(options),"));
    assert!(out.contains("readonly \"uploadRaw\": (options: globalThis.FormData) => Effect.Effect<void, "));
    assert!(!out.contains("bodyUnsafeJson"));
}

#[test]
fn test_deep_object_query_parameter() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/search": {
                "get": {
                    "operationId": "search",
                    "parameters": [{
                        "name": "filter",
                        "in": "query",
                        "style": "deepObject",
                        "schema": {
                            "type": "object",
                            "required": ["x"],
                            "properties": { "x": { "type": "integer" }, "y": { "type": "string" } }
                        }
                    }],
                    "responses": { "204": { "description": "Done" } }
                }
            }
        }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains(
        "export class SearchParams extends S.Struct({\n  \"filter[x]\": S.Int,\n  \"filter[y]\": S.optionalWith(S.String, { nullable: true })\n}) {}"
    ));
    assert!(out.contains(
        "HttpClientRequest.setUrlParams({ \"filter[x]\": options[\"filter[x]\"] as any, \"filter[y]\": options[\"filter[y]\"] as any }),"
    ));
    assert!(out.contains("readonly \"search\": (options: typeof SearchParams.Encoded) => Effect.Effect<void, "));
}

#[test]
fn test_malformed_keyword_keeps_sibling_properties() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/pets": { "get": {
                "operationId": "getPet",
                "responses": {
                    "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } } }
                }
            } }
        },
        "components": { "schemas": {
            "Pet": {
                "type": "object",
                "required": ["id"],
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string", "required": true, "minLength": 1.0 }
                }
            }
        } }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains(
        "export class Pet extends S.Class<Pet>(\"Pet\")({\n  \"id\": S.String,\n  \"name\": S.optionalWith(S.String, { nullable: true })\n}) {}"
    ));
}

#[test]
fn test_duplicate_operation_ids_decode_their_own_responses() {
    let response = |kind: &str| json!({
        "200": { "content": { "application/json": { "schema": { "type": kind } } } }
    });
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/a": { "get": { "operationId": "list", "responses": response("string") } },
            "/b": { "get": { "operationId": "list", "responses": response("number") } }
        }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains("export class List200 extends S.String {}"));
    assert!(out.contains("export class List2200 extends S.Number {}"));
    assert!(out.contains("\"200\": decodeSuccess(List200),"));
    assert!(out.contains("\"200\": decodeSuccess(List2200),"));
}

#[test]
fn test_closed_object_response_is_declared() {
    let document = json!({
        "openapi": "3.0.3",
        "paths": {
            "/empty": { "get": {
                "operationId": "empty",
                "responses": {
                    "200": { "content": { "application/json": { "schema": {
                        "type": "object", "additionalProperties": false
                    } } } }
                }
            } }
        }
    });
    let out = generate(&document, &options(Flavor::Schema));
    assert!(out.contains(
        "export class Empty200 extends S.Record({ key: S.String, value: S.Never }) {}"
    ));
    assert!(out.contains("decodeSuccess(Empty200)"));

    let out = generate(&document, &options(Flavor::TypeOnly));
    assert!(out.contains("export type Empty200 = Record<string, never>"));
}
