/// Per-form renderers: one `VSpec` node to one PropTypes expression.
///
/// Every renderer takes a `prefix` (text before the expression on its
/// first line) and a `suffix` (text after it on its last line), so nested
/// combinators can wrap multi-line children without buffering them.
use super::writer::{member, object_key, CodeWriter};
use crate::vspec::{Field, PrimitiveKind, VSpec};
use serde_json::Value;

/// Name of the module-level mapping that references resolve through.
pub const PROPS_BINDING: &str = "props";

/// Leaf checker name for a primitive.
pub fn primitive_checker(binding: &str, kind: PrimitiveKind) -> String {
    let name = match kind {
        PrimitiveKind::String => "string",
        PrimitiveKind::Number => "number",
        PrimitiveKind::Boolean => "bool",
        PrimitiveKind::Object => "object",
    };
    format!("{binding}.{name}")
}

/// `oneOf([...])` with each literal rendered as JSON.
pub fn enum_checker(binding: &str, allowed: &[Value]) -> String {
    let items: Vec<String> = allowed.iter().map(Value::to_string).collect();
    format!("{binding}.oneOf([{}])", items.join(", "))
}

/// A lazily resolved reference. Wrapping the thunk in `oneOfType` gives it
/// an `isRequired` variant like every other checker.
pub fn reference_checker(binding: &str, name: &str) -> String {
    let target = member(PROPS_BINDING, name);
    format!("{binding}.oneOfType([(...args) => {target}(...args)])")
}

/// Emit `prefix + <expr for spec> + suffix`, possibly over several lines.
pub fn emit_expr(w: &mut CodeWriter, binding: &str, prefix: &str, spec: &VSpec, suffix: &str) {
    match spec {
        VSpec::Primitive(kind) => {
            w.line(&format!("{prefix}{}{suffix}", primitive_checker(binding, *kind)));
        }
        VSpec::Enum { allowed } => {
            w.line(&format!("{prefix}{}{suffix}", enum_checker(binding, allowed)));
        }
        VSpec::Reference { name } => {
            w.line(&format!("{prefix}{}{suffix}", reference_checker(binding, name)));
        }
        VSpec::Array { item } => {
            emit_expr(
                w,
                binding,
                &format!("{prefix}{binding}.arrayOf("),
                item,
                &format!("){suffix}"),
            );
        }
        VSpec::Map { value } => {
            emit_expr(
                w,
                binding,
                &format!("{prefix}{binding}.objectOf("),
                value,
                &format!("){suffix}"),
            );
        }
        VSpec::Shape { fields, exact } => {
            let combinator = if *exact { "exact" } else { "shape" };
            w.open(&format!("{prefix}{binding}.{combinator}({{"));
            emit_fields(w, binding, fields);
            w.close(&format!("}}){suffix}"));
        }
    }
}

/// One `key: <expr>[.isRequired],` entry per field, in declared order.
pub fn emit_fields(w: &mut CodeWriter, binding: &str, fields: &[Field]) {
    for field in fields {
        let prefix = format!("{}: ", object_key(&field.name));
        let suffix = if field.required { ".isRequired," } else { "," };
        emit_expr(w, binding, &prefix, &field.spec, suffix);
    }
}
