/// Schema compiler: turns Swagger definitions into `VSpec` trees.
///
/// Compilation is two-phase. Pass 1 registers a slot for every object
/// definition; pass 2 compiles each body. `$ref`s compile to name-keyed
/// `VSpec::Reference` nodes, so forward and circular references never need
/// the target to exist at compile time.
use crate::schema::{AdditionalProperties, Definitions, SchemaDef, SchemaType};
use crate::vspec::{Field, PrimitiveKind, SpecTable, VSpec};

const REF_PREFIX: &str = "#/definitions/";

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("schema must be a JSON object")]
    NotAnObject,
    #[error("document has no 'definitions' section")]
    MissingDefinitions,
    #[error("definitions must be a JSON object")]
    DefinitionsNotObject,
    #[error("properties must be a JSON object")]
    PropertiesNotObject,
    #[error("required must be an array of strings")]
    InvalidRequired,
    #[error("ref must be a string")]
    RefNotString,
    #[error("malformed ref '{0}': expected '#/definitions/<name>'")]
    MalformedRef(String),
    #[error("type must be a string")]
    TypeNotString,
    #[error("enum must be an array")]
    InvalidEnum,
    #[error("Unknown definition type \"{0}\"")]
    UnknownType(String),
    #[error("definition has no type, ref or enum")]
    MissingType,
    #[error("array definition has no 'items'")]
    MissingItems,
    #[error("definition '{0}': {1}")]
    InDefinition(String, Box<CompileError>),
    #[error("property '{0}': {1}")]
    InProperty(String, Box<CompileError>),
}

/// Extract the target name from a `#/definitions/<name>` pointer.
pub fn parse_ref_name(pointer: &str) -> Result<&str, CompileError> {
    match pointer.strip_prefix(REF_PREFIX) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(CompileError::MalformedRef(pointer.to_string())),
    }
}

/// Compile one schema node.
pub fn compile_field(def: &SchemaDef) -> Result<VSpec, CompileError> {
    if let Some(pointer) = &def.reference {
        let name = parse_ref_name(pointer)?;
        return Ok(VSpec::Reference {
            name: name.to_string(),
        });
    }

    // enum can annotate any primitive type, so it wins over `type`
    if let Some(allowed) = &def.enum_values {
        return Ok(VSpec::Enum {
            allowed: allowed.clone(),
        });
    }

    let type_name = def.type_name.as_deref().ok_or(CompileError::MissingType)?;
    let schema_type =
        SchemaType::parse(type_name).ok_or_else(|| CompileError::UnknownType(type_name.into()))?;

    match schema_type {
        SchemaType::Array => {
            let items = def.items.as_deref().ok_or(CompileError::MissingItems)?;
            Ok(VSpec::Array {
                item: Box::new(compile_field(items)?),
            })
        }
        SchemaType::Boolean => Ok(VSpec::Primitive(PrimitiveKind::Boolean)),
        SchemaType::Integer | SchemaType::Number => Ok(VSpec::Primitive(PrimitiveKind::Number)),
        SchemaType::Object => compile_object(def, true),
        SchemaType::String => Ok(VSpec::Primitive(PrimitiveKind::String)),
    }
}

/// Object rule: map when only `additionalProperties` is given, an
/// unconstrained object when nothing is declared, a shape otherwise.
///
/// `exact` is the default strictness for a shape; `additionalProperties:
/// true` next to `properties` always leaves the shape open.
fn compile_object(def: &SchemaDef, exact: bool) -> Result<VSpec, CompileError> {
    let properties = match &def.properties {
        Some(props) if !props.is_empty() => props,
        Some(_) => return Ok(VSpec::Primitive(PrimitiveKind::Object)),
        None => {
            return match &def.additional_properties {
                Some(AdditionalProperties::Schema(values)) => Ok(VSpec::Map {
                    value: Box::new(compile_field(values)?),
                }),
                Some(AdditionalProperties::Any) | None => {
                    Ok(VSpec::Primitive(PrimitiveKind::Object))
                }
            };
        }
    };

    let fields = properties
        .iter()
        .map(|(key, prop)| compile_property(key, def.is_required(key), prop))
        .collect::<Result<Vec<_>, _>>()?;

    let exact = exact && def.additional_properties != Some(AdditionalProperties::Any);
    Ok(VSpec::Shape { fields, exact })
}

/// Compile one property of an object. A required property rejects both
/// an absent key and `null`.
pub fn compile_property(
    name: &str,
    is_required: bool,
    def: &SchemaDef,
) -> Result<Field, CompileError> {
    let spec =
        compile_field(def).map_err(|e| CompileError::InProperty(name.to_string(), Box::new(e)))?;
    Ok(Field {
        name: name.to_string(),
        spec,
        required: is_required,
    })
}

/// Compile every object definition into a shared table.
///
/// Top-level shapes are open (extra keys allowed); use
/// `Validator::check_exact` for an exact top-level check. Non-object
/// definitions are skipped.
pub fn compile_all(defs: &Definitions) -> Result<SpecTable, CompileError> {
    let mut table = SpecTable::new();
    let mut pending = Vec::new();

    // Pass 1: register every object definition
    for (name, def) in defs.iter() {
        if def.describes_object() {
            pending.push((table.register(name), name, def));
        } else {
            tracing::info!(definition = name, "skipping non-object definition");
        }
    }

    // Pass 2: compile bodies
    for (id, name, def) in pending {
        let spec = compile_object(def, false)
            .map_err(|e| CompileError::InDefinition(name.to_string(), Box::new(e)))?;
        tracing::debug!(definition = name, "compiled definition");
        table.fill(id, spec);
    }

    for name in table.dangling_references() {
        tracing::warn!(reference = %name, "reference target is not a compiled definition");
    }

    Ok(table)
}

/// Compile the `definitions` section of a whole Swagger document.
pub fn compile_document(document: &serde_json::Value) -> Result<SpecTable, CompileError> {
    compile_all(&Definitions::from_document(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(def: serde_json::Value) -> Result<VSpec, CompileError> {
        compile_field(&SchemaDef::from_value(&def).unwrap())
    }

    fn defs(map: serde_json::Value) -> Definitions {
        Definitions::from_map(&map).unwrap()
    }

    #[test]
    fn test_compile_primitives() {
        assert_eq!(
            field(json!({"type": "string"})).unwrap(),
            VSpec::Primitive(PrimitiveKind::String)
        );
        assert_eq!(
            field(json!({"type": "boolean"})).unwrap(),
            VSpec::Primitive(PrimitiveKind::Boolean)
        );
        assert_eq!(
            field(json!({"type": "number"})).unwrap(),
            VSpec::Primitive(PrimitiveKind::Number)
        );
        assert_eq!(
            field(json!({"type": "integer"})).unwrap(),
            VSpec::Primitive(PrimitiveKind::Number)
        );
    }

    #[test]
    fn test_reject_unknown_type() {
        let err = field(json!({"type": "whatever"})).unwrap_err();
        assert!(matches!(err, CompileError::UnknownType(ref t) if t == "whatever"));
        assert_eq!(err.to_string(), "Unknown definition type \"whatever\"");
    }

    #[test]
    fn test_reject_missing_type() {
        assert!(matches!(field(json!({})), Err(CompileError::MissingType)));
    }

    #[test]
    fn test_reject_array_without_items() {
        assert!(matches!(
            field(json!({"type": "array"})),
            Err(CompileError::MissingItems)
        ));
    }

    #[test]
    fn test_enum_wins_over_type() {
        assert_eq!(
            field(json!({"type": "string", "enum": ["one", "two"]})).unwrap(),
            VSpec::Enum {
                allowed: vec![json!("one"), json!("two")]
            }
        );
    }

    #[test]
    fn test_ref_wins_over_everything() {
        let spec = compile_field(
            &SchemaDef::from_value(&json!({"$ref": "#/definitions/Tag", "type": "bogus"}))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(spec, VSpec::Reference { name: "Tag".into() });
    }

    #[test]
    fn test_compile_property() {
        let def = SchemaDef::from_value(&json!({"$ref": "#/definitions/Tag"})).unwrap();
        assert_eq!(
            compile_property("tag", true, &def).unwrap(),
            Field {
                name: "tag".into(),
                spec: VSpec::Reference { name: "Tag".into() },
                required: true,
            }
        );

        let bad = SchemaDef::from_value(&json!({"type": "array"})).unwrap();
        assert_eq!(
            compile_property("tags", false, &bad).unwrap_err().to_string(),
            "property 'tags': array definition has no 'items'"
        );
    }

    #[test]
    fn test_parse_ref_name() {
        assert_eq!(parse_ref_name("#/definitions/Pet").unwrap(), "Pet");
        assert!(matches!(
            parse_ref_name("#/components/schemas/Pet"),
            Err(CompileError::MalformedRef(_))
        ));
        assert!(matches!(
            parse_ref_name("#/definitions/"),
            Err(CompileError::MalformedRef(_))
        ));
        assert!(matches!(
            parse_ref_name("other.json#/definitions/Pet"),
            Err(CompileError::MalformedRef(_))
        ));
    }

    #[test]
    fn test_compile_array_of_refs() {
        assert_eq!(
            field(json!({"type": "array", "items": {"$ref": "#/definitions/Tag"}})).unwrap(),
            VSpec::Array {
                item: Box::new(VSpec::Reference { name: "Tag".into() })
            }
        );
    }

    #[test]
    fn test_compile_nested_object_is_exact() {
        let spec = field(json!({
            "type": "object",
            "properties": {
                "one": {"type": "string"},
                "two": {"type": "boolean"}
            },
            "required": ["two"]
        }))
        .unwrap();
        assert_eq!(
            spec,
            VSpec::Shape {
                fields: vec![
                    Field {
                        name: "one".into(),
                        spec: VSpec::Primitive(PrimitiveKind::String),
                        required: false,
                    },
                    Field {
                        name: "two".into(),
                        spec: VSpec::Primitive(PrimitiveKind::Boolean),
                        required: true,
                    },
                ],
                exact: true,
            }
        );
    }

    #[test]
    fn test_open_shape_with_additional_properties_true() {
        let spec = field(json!({
            "type": "object",
            "properties": {"one": {"type": "string"}},
            "additionalProperties": true
        }))
        .unwrap();
        assert!(matches!(spec, VSpec::Shape { exact: false, .. }));
    }

    #[test]
    fn test_object_forms() {
        assert_eq!(
            field(json!({"type": "object", "additionalProperties": {"type": "string"}})).unwrap(),
            VSpec::Map {
                value: Box::new(VSpec::Primitive(PrimitiveKind::String))
            }
        );
        assert_eq!(
            field(json!({"type": "object"})).unwrap(),
            VSpec::Primitive(PrimitiveKind::Object)
        );
        assert_eq!(
            field(json!({"type": "object", "properties": {}})).unwrap(),
            VSpec::Primitive(PrimitiveKind::Object)
        );
    }

    #[test]
    fn test_property_errors_are_located() {
        let err = field(json!({
            "type": "object",
            "properties": {"bad": {"type": "date"}}
        }))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "property 'bad': Unknown definition type \"date\""
        );
    }

    #[test]
    fn test_compile_all_skips_non_objects() {
        let table = compile_all(&defs(json!({
            "DefOne": {
                "type": "object",
                "properties": {"one": {"type": "string"}, "two": {"type": "number"}},
                "required": ["two"]
            },
            "DefThree": {"type": "string"}
        })))
        .unwrap();
        assert!(table.contains("DefOne"));
        assert!(!table.contains("DefThree"));
        assert!(matches!(
            table.get("DefOne"),
            Some(VSpec::Shape { exact: false, .. })
        ));
    }

    #[test]
    fn test_compile_all_untyped_objects() {
        let table = compile_all(&defs(json!({
            "Labels": {"additionalProperties": {"type": "string"}},
            "Point": {"properties": {"x": {"type": "number"}}}
        })))
        .unwrap();
        assert!(matches!(table.get("Labels"), Some(VSpec::Map { .. })));
        assert!(matches!(table.get("Point"), Some(VSpec::Shape { .. })));
    }

    #[test]
    fn test_compile_all_forward_and_self_references() {
        let table = compile_all(&defs(json!({
            "Pet": {
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"$ref": "#/definitions/Tag"}}
                }
            },
            "Tag": {
                "type": "object",
                "properties": {"parent": {"$ref": "#/definitions/Tag"}}
            }
        })))
        .unwrap();
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Pet", "Tag"]);
        assert!(table.dangling_references().is_empty());
    }

    #[test]
    fn test_compile_all_tolerates_dangling_references() {
        let table = compile_all(&defs(json!({
            "Pet": {
                "type": "object",
                "properties": {"owner": {"$ref": "#/definitions/Person"}}
            }
        })))
        .unwrap();
        assert_eq!(table.dangling_references(), vec!["Person".to_string()]);
    }

    #[test]
    fn test_compile_all_errors_name_the_definition() {
        let err = compile_all(&defs(json!({
            "Pet": {
                "type": "object",
                "properties": {"owner": {"$ref": "Person"}}
            }
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "definition 'Pet': property 'owner': malformed ref 'Person': expected '#/definitions/<name>'"
        );
    }

    #[test]
    fn test_compile_document() {
        let table = compile_document(&json!({
            "swagger": "2.0",
            "definitions": {"Pet": {"type": "object", "properties": {"name": {"type": "string"}}}}
        }))
        .unwrap();
        assert_eq!(table.len(), 1);
    }
}
