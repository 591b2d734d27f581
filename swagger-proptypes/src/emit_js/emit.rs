/// Top-level composition: walks a compiled `SpecTable` and produces a
/// complete ES module that builds one PropTypes checker per definition.
use super::expr::{emit_expr, PROPS_BINDING};
use super::writer::{member, CodeWriter};
use crate::compiler::{compile_all, CompileError};
use crate::schema::Definitions;
use crate::vspec::SpecTable;

/// Names used in the generated `import` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Local binding for the checker library, e.g. `PropTypes`.
    pub binding: String,
    /// Package the binding is imported from, e.g. `prop-types`.
    pub package: String,
}

impl Default for ModuleOptions {
    fn default() -> Self {
        Self {
            binding: "PropTypes".into(),
            package: "prop-types".into(),
        }
    }
}

/// Emit a complete ES module from a compiled table.
pub fn emit(table: &SpecTable, options: &ModuleOptions) -> String {
    let mut w = CodeWriter::new();

    w.line(&format!(
        "import {} from '{}';",
        options.binding, options.package
    ));
    w.blank();
    w.line(&format!("const {PROPS_BINDING} = {{}};"));
    w.blank();

    for (name, spec) in table.iter() {
        let target = member(PROPS_BINDING, name);
        emit_expr(&mut w, &options.binding, &format!("{target} = "), spec, ";");
        w.blank();
    }

    w.line(&format!("export default {PROPS_BINDING};"));
    w.finish()
}

/// Compile `defs` and emit the module with default options.
pub fn module_from_defs(defs: &Definitions) -> Result<String, CompileError> {
    let table = compile_all(defs)?;
    Ok(emit(&table, &ModuleOptions::default()))
}
