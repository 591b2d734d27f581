/// Typed view of a Swagger/OpenAPI 2.0 `definitions` section.
/// Only the narrow vocabulary the compiler understands is read; every
/// other keyword on a node is ignored.
use crate::compiler::CompileError;
use serde_json::{Map, Value};

/// The `type` keywords a definition may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl SchemaType {
    pub fn parse(s: &str) -> Option<SchemaType> {
        match s {
            "string" => Some(SchemaType::String),
            "number" => Some(SchemaType::Number),
            "integer" => Some(SchemaType::Integer),
            "boolean" => Some(SchemaType::Boolean),
            "array" => Some(SchemaType::Array),
            "object" => Some(SchemaType::Object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }
}

/// `additionalProperties` is either a schema for every extra value or
/// `true` (anything goes). `false` is read as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalProperties {
    Any,
    Schema(Box<SchemaDef>),
}

/// One node of the input document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDef {
    /// Raw `type` keyword. Kept as written so the compiler can report
    /// unknown names instead of the parser swallowing them.
    pub type_name: Option<String>,
    /// `properties`, in document order.
    pub properties: Option<Vec<(String, SchemaDef)>>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub items: Option<Box<SchemaDef>>,
    pub enum_values: Option<Vec<Value>>,
    /// Raw `$ref` pointer, e.g. `#/definitions/Pet`.
    pub reference: Option<String>,
}

impl SchemaDef {
    /// Read a node from JSON.
    pub fn from_value(json: &Value) -> Result<SchemaDef, CompileError> {
        let obj = json.as_object().ok_or(CompileError::NotAnObject)?;

        let type_name = match obj.get("type") {
            None => None,
            Some(v) => Some(v.as_str().ok_or(CompileError::TypeNotString)?.to_string()),
        };

        let reference = match obj.get("$ref") {
            None => None,
            Some(v) => Some(v.as_str().ok_or(CompileError::RefNotString)?.to_string()),
        };

        let enum_values = match obj.get("enum") {
            None => None,
            Some(v) => Some(v.as_array().ok_or(CompileError::InvalidEnum)?.clone()),
        };

        let properties = match obj.get("properties") {
            None => None,
            Some(v) => {
                let props = v.as_object().ok_or(CompileError::PropertiesNotObject)?;
                Some(read_properties(props)?)
            }
        };

        let required = match obj.get("required") {
            None => Vec::new(),
            Some(v) => v
                .as_array()
                .ok_or(CompileError::InvalidRequired)?
                .iter()
                .map(|name| {
                    name.as_str()
                        .map(str::to_string)
                        .ok_or(CompileError::InvalidRequired)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        let additional_properties = match obj.get("additionalProperties") {
            None | Some(Value::Bool(false)) => None,
            Some(Value::Bool(true)) => Some(AdditionalProperties::Any),
            Some(v) => Some(AdditionalProperties::Schema(Box::new(SchemaDef::from_value(v)?))),
        };

        let items = match obj.get("items") {
            None => None,
            Some(v) => Some(Box::new(SchemaDef::from_value(v)?)),
        };

        Ok(SchemaDef {
            type_name,
            properties,
            required,
            additional_properties,
            items,
            enum_values,
            reference,
        })
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|r| r == key)
    }

    /// Whether this node describes an object: either `type: object`, or no
    /// type/ref/enum at all but some object keyword.
    pub fn describes_object(&self) -> bool {
        match self.type_name.as_deref() {
            Some(t) => SchemaType::parse(t) == Some(SchemaType::Object),
            None => {
                self.reference.is_none()
                    && self.enum_values.is_none()
                    && (self.properties.is_some() || self.additional_properties.is_some())
            }
        }
    }
}

fn read_properties(props: &Map<String, Value>) -> Result<Vec<(String, SchemaDef)>, CompileError> {
    let mut out = Vec::with_capacity(props.len());
    for (key, schema) in props {
        out.push((key.clone(), SchemaDef::from_value(schema)?));
    }
    Ok(out)
}

/// The named definitions of a document, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Definitions {
    entries: Vec<(String, SchemaDef)>,
}

impl Definitions {
    /// Read a bare `{ "<Name>": <SchemaDef>, ... }` object.
    pub fn from_map(json: &Value) -> Result<Definitions, CompileError> {
        let obj = json.as_object().ok_or(CompileError::DefinitionsNotObject)?;
        let mut entries = Vec::with_capacity(obj.len());
        for (name, schema) in obj {
            let def = SchemaDef::from_value(schema)
                .map_err(|e| CompileError::InDefinition(name.clone(), Box::new(e)))?;
            entries.push((name.clone(), def));
        }
        Ok(Definitions { entries })
    }

    /// Read the `definitions` member of a full Swagger document.
    pub fn from_document(json: &Value) -> Result<Definitions, CompileError> {
        let obj = json.as_object().ok_or(CompileError::NotAnObject)?;
        let defs = obj
            .get("definitions")
            .ok_or(CompileError::MissingDefinitions)?;
        Definitions::from_map(defs)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDef> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, def)| def)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaDef)> {
        self.entries.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SchemaDef)> for Definitions {
    fn from_iter<T: IntoIterator<Item = (String, SchemaDef)>>(iter: T) -> Self {
        Definitions {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_keyword_roundtrip() {
        for kw in ["string", "number", "integer", "boolean", "array", "object"] {
            assert_eq!(SchemaType::parse(kw).map(|t| t.as_str()), Some(kw));
        }
        assert_eq!(SchemaType::parse("whatever"), None);
    }

    #[test]
    fn test_read_object_node() {
        let def = SchemaDef::from_value(&json!({
            "type": "object",
            "required": ["two"],
            "properties": {
                "one": {"type": "number"},
                "two": {"type": "boolean"}
            }
        }))
        .unwrap();
        assert_eq!(def.type_name.as_deref(), Some("object"));
        let keys: Vec<&str> = def
            .properties
            .as_ref()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["one", "two"]);
        assert!(def.is_required("two"));
        assert!(!def.is_required("one"));
    }

    #[test]
    fn test_properties_keep_document_order() {
        let def = SchemaDef::from_value(&json!({
            "properties": {"zeta": {"type": "string"}, "alpha": {"type": "string"}}
        }))
        .unwrap();
        let props = def.properties.unwrap();
        assert_eq!(props[0].0, "zeta");
        assert_eq!(props[1].0, "alpha");
    }

    #[test]
    fn test_additional_properties_forms() {
        let any = SchemaDef::from_value(&json!({"type": "object", "additionalProperties": true}))
            .unwrap();
        assert_eq!(any.additional_properties, Some(AdditionalProperties::Any));

        let off = SchemaDef::from_value(&json!({"type": "object", "additionalProperties": false}))
            .unwrap();
        assert_eq!(off.additional_properties, None);

        let typed = SchemaDef::from_value(&json!({"additionalProperties": {"type": "string"}}))
            .unwrap();
        assert!(matches!(
            typed.additional_properties,
            Some(AdditionalProperties::Schema(_))
        ));
        assert!(typed.describes_object());
    }

    #[test]
    fn test_reject_malformed_nodes() {
        assert!(matches!(
            SchemaDef::from_value(&json!("string")),
            Err(CompileError::NotAnObject)
        ));
        assert!(matches!(
            SchemaDef::from_value(&json!({"$ref": 3})),
            Err(CompileError::RefNotString)
        ));
        assert!(matches!(
            SchemaDef::from_value(&json!({"type": ["string"]})),
            Err(CompileError::TypeNotString)
        ));
        assert!(matches!(
            SchemaDef::from_value(&json!({"enum": "a"})),
            Err(CompileError::InvalidEnum)
        ));
        assert!(matches!(
            SchemaDef::from_value(&json!({"required": [1]})),
            Err(CompileError::InvalidRequired)
        ));
        assert!(matches!(
            SchemaDef::from_value(&json!({"properties": []})),
            Err(CompileError::PropertiesNotObject)
        ));
    }

    #[test]
    fn test_definitions_from_document() {
        let doc = json!({
            "swagger": "2.0",
            "definitions": {
                "Pet": {"type": "object"},
                "Tag": {"type": "object"}
            }
        });
        let defs = Definitions::from_document(&doc).unwrap();
        assert_eq!(defs.len(), 2);
        let names: Vec<&str> = defs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Pet", "Tag"]);
        assert!(defs.get("Tag").is_some());
        assert!(defs.get("Order").is_none());
    }

    #[test]
    fn test_definitions_errors_name_the_definition() {
        let doc = json!({"definitions": {"Pet": {"$ref": false}}});
        let err = Definitions::from_document(&doc).unwrap_err();
        assert_eq!(err.to_string(), "definition 'Pet': ref must be a string");
        assert!(matches!(
            Definitions::from_document(&json!({"paths": {}})),
            Err(CompileError::MissingDefinitions)
        ));
        assert!(matches!(
            Definitions::from_document(&json!({"definitions": []})),
            Err(CompileError::DefinitionsNotObject)
        ));
    }
}
