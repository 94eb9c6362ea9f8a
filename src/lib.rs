//! # gotize
//!
//! Compile [JSON Schema](https://json-schema.org/) documents into Go type
//! declarations.
//!
//! ## Features
//!
//! - Supports a draft-04 profile: `type`, `properties`, `items`, `required`,
//!   `enum`, `format`, `$ref`, `additionalProperties`, `definitions`/`$defs`
//! - Resolves local and cross-document `$ref` pointers, including cycles
//! - Maps `date`/`date-time` formats to `time.Time`, `byte` to `[]byte`
//! - Falls back to `interface{}` for types that cannot be unified
//! - Deduplicates structurally identical types and names them collision-free
//! - Byte-identical output for identical input
//! - CLI tool `jsonschema2go` for batch generation
//!
//! ## Example (Programmatic Usage)
//!
//! ```
//! use gotize::{Options, generate_to_string};
//!
//! let schema = r#"{
//!     "type": "object",
//!     "properties": {
//!         "name": { "type": "string" },
//!         "age": { "type": "integer" }
//!     },
//!     "required": ["name"]
//! }"#;
//!
//! let code = generate_to_string(&[("person.json", schema)], &Options::default()).unwrap();
//! assert!(code.contains("type Person struct {"));
//! assert!(code.contains("Age  *int   `json:\"age,omitempty\"`"));
//! ```
//!
//! ## Example (CLI)
//!
//! ```bash
//! jsonschema2go -p models -o models.go person.json address.json
//! ```
//!
//! ## Crate Layout
//!
//! - [`parser`]: Schema text → [`Document`] trees
//! - [`resolver`]: `$ref` resolution into a [`SchemaGraph`]
//! - [`builder`]: Naming, deduplication and type decisions → [`TypeModel`]
//! - [`emitter`]: [`TypeModel`] → Go source text
//! - [`schema`], [`model`]: Input and output data types
//! - [`common`]: Helpers for names and hashing
//!
//! The CLI binary is enabled with the `cli` feature.
pub mod builder;
pub mod common;
pub mod emitter;
pub mod error;
pub mod model;
pub mod parser;
pub mod resolver;
pub mod schema;

pub use builder::{Options, build};
pub use emitter::{emit, render};
pub use error::{Error, Result};
pub use model::TypeModel;
pub use parser::{parse_batch, parse_document};
pub use resolver::{SchemaGraph, resolve};
pub use schema::{Document, Schema};

use std::io::Write;

/// Run the whole pipeline over a batch of `(name, text)` sources and write
/// the declarations to `out`.
///
/// Nothing is written unless every stage succeeds.
pub fn generate<N, T, W>(sources: &[(N, T)], options: &Options, out: &mut W) -> Result<()>
where
    N: AsRef<str>,
    T: AsRef<str>,
    W: Write,
{
    let model = compile(sources, options)?;
    emit(&model, out)?;
    Ok(())
}

/// Like [`generate`], returning the declarations as a string.
pub fn generate_to_string<N, T>(sources: &[(N, T)], options: &Options) -> Result<String>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    Ok(render(&compile(sources, options)?))
}

/// Parse, resolve and build a batch into its type model.
pub fn compile<N, T>(sources: &[(N, T)], options: &Options) -> Result<TypeModel>
where
    N: AsRef<str>,
    T: AsRef<str>,
{
    let documents = parse_batch(sources)?;
    let graph = resolve(&documents)?;
    build(&graph, options)
}
