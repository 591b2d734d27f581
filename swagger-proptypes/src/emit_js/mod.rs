/// PropTypes module backend: renders compiled definitions as JS source.
mod emit;
mod expr;
mod writer;

pub use emit::{emit, module_from_defs, ModuleOptions};
pub use expr::{emit_expr, emit_fields, enum_checker, primitive_checker, reference_checker};
pub use writer::{escape_js, CodeWriter};
