use swagger_proptypes::source::parse_document;
use swagger_proptypes::{compile_all, module_from_defs, SpecTable, Validator, Violation};
use wasm_bindgen::prelude::*;

fn compile(definitions_json: &str) -> Result<SpecTable, JsError> {
    let defs = parse_document(definitions_json).map_err(|e| JsError::new(&e.to_string()))?;
    compile_all(&defs).map_err(|e| JsError::new(&e.to_string()))
}

fn to_js(violations: &[Violation]) -> Result<JsValue, JsError> {
    let arr = js_sys::Array::new();
    for v in violations {
        let obj = js_sys::Object::new();
        let via = js_sys::Array::new();
        for step in &v.via {
            via.push(&JsValue::from_str(step));
        }
        let entries: [(&str, JsValue); 4] = [
            ("path", v.path.to_string().into()),
            ("message", v.message.as_str().into()),
            ("kind", format!("{:?}", v.kind).into()),
            ("via", via.into()),
        ];
        for (key, value) in entries {
            js_sys::Reflect::set(&obj, &key.into(), &value)
                .map_err(|_| JsError::new("cannot build violation object"))?;
        }
        arr.push(&obj);
    }
    Ok(arr.into())
}

/// Validate a JSON instance against one definition of a Swagger document.
/// Returns an array of `{path, message, kind, via}` objects, empty when
/// the instance conforms.
#[wasm_bindgen]
pub fn validate(
    document_json: &str,
    definition: &str,
    instance_json: &str,
) -> Result<JsValue, JsError> {
    let table = compile(document_json)?;
    let instance: serde_json::Value = serde_json::from_str(instance_json)
        .map_err(|e| JsError::new(&format!("Invalid JSON: {e}")))?;
    let violations = Validator::new(&table)
        .validate_definition(definition, &instance)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&violations)
}

/// Like `validate`, but undeclared top-level keys are reported too.
#[wasm_bindgen(js_name = checkExact)]
pub fn check_exact(
    document_json: &str,
    definition: &str,
    instance_json: &str,
) -> Result<JsValue, JsError> {
    let table = compile(document_json)?;
    let instance: serde_json::Value = serde_json::from_str(instance_json)
        .map_err(|e| JsError::new(&format!("Invalid JSON: {e}")))?;
    let violations = Validator::new(&table)
        .check_exact_definition(definition, &instance)
        .map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&violations)
}

/// Render the PropTypes module for a Swagger document.
#[wasm_bindgen]
pub fn module(document_json: &str) -> Result<String, JsError> {
    let defs = parse_document(document_json).map_err(|e| JsError::new(&e.to_string()))?;
    module_from_defs(&defs).map_err(|e| JsError::new(&e.to_string()))
}
