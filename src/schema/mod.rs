//! Stream schema module
//!
//! Every stream has a static JSON schema shipped with the binary. Records are
//! conformed to it before they are emitted.
//!
//! # Features
//!
//! - **Embedded Schemas**: One document per stream under `definitions/schemas`
//! - **Type Coercion**: Scalars converted to the declared type where lossless
//! - **Field Filtering**: Undeclared fields dropped unless the schema allows them
//! - **Nested Support**: Objects and arrays conformed recursively

mod conform;
mod registry;
mod types;

pub use conform::conform_record;
pub use registry::{get_builtin, load_schema, BUILTIN_SCHEMAS};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
