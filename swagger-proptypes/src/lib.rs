//! Compile Swagger/OpenAPI 2.0 `definitions` into shape validators.
//!
//! ```text
//! definitions ──compile_all──▶ SpecTable ──Validator──▶ Vec<Violation>
//!                                   └──────emit_js─────▶ PropTypes module
//! ```
//!
//! Validation collects every violation. Only broken schemas (malformed
//! `$ref`, unknown `type`, a reference to a missing definition) are
//! reported as errors.
pub mod compiler;
pub mod datum;
pub mod emit_js;
pub mod instance;
pub mod schema;
pub mod source;
pub mod validator;
pub mod vspec;

pub use compiler::{
    compile_all, compile_document, compile_field, compile_property, parse_ref_name,
    CompileError,
};
pub use datum::Datum;
pub use emit_js::{module_from_defs, ModuleOptions};
pub use instance::{Instance, ValueKind};
pub use schema::{Definitions, SchemaDef, SchemaType};
pub use validator::{
    check_exact, validate, Path, Segment, ValidateError, Validator, Violation, ViolationKind,
};
pub use vspec::{Field, PrimitiveKind, SpecTable, VSpec};
