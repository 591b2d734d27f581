/// Compiled validator forms. A `VSpec` tree describes the expected shape
/// of conforming data; references between named definitions stay as names
/// and are looked up in a `SpecTable` only when data is validated.
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Leaf type checks. `Object` accepts any keyed object without looking
/// inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    Object,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Object => "object",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared property of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub spec: VSpec,
    pub required: bool,
}

/// A compiled schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum VSpec {
    Primitive(PrimitiveKind),
    /// Value must equal one of the literals.
    Enum { allowed: Vec<Value> },
    /// Sequence whose every element matches `item`.
    Array { item: Box<VSpec> },
    /// Keyed object with declared fields, in declaration order. When
    /// `exact`, undeclared keys are rejected.
    Shape { fields: Vec<Field>, exact: bool },
    /// Keyed object whose every value matches `value`.
    Map { value: Box<VSpec> },
    /// Late-bound pointer to a named table entry.
    Reference { name: String },
}

impl VSpec {
    /// Visit every reference name reachable in this tree without following
    /// references.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            VSpec::Primitive(_) | VSpec::Enum { .. } => {}
            VSpec::Array { item } => item.for_each_reference(f),
            VSpec::Map { value } => value.for_each_reference(f),
            VSpec::Shape { fields, .. } => {
                for field in fields {
                    field.spec.for_each_reference(f);
                }
            }
            VSpec::Reference { name } => f(name),
        }
    }
}

/// Stable handle to a slot in a `SpecTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecId(usize);

/// Arena of named compiled definitions.
///
/// Slots are registered before any body is compiled, so every name is
/// known up front. A slot holds `None` until its body is filled in.
#[derive(Debug, Clone, Default)]
pub struct SpecTable {
    names: Vec<String>,
    slots: Vec<Option<VSpec>>,
    index: HashMap<String, SpecId>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a slot for `name`. Registering a name twice returns the
    /// existing slot.
    pub fn register(&mut self, name: &str) -> SpecId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = SpecId(self.slots.len());
        self.names.push(name.to_string());
        self.slots.push(None);
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn fill(&mut self, id: SpecId, spec: VSpec) {
        self.slots[id.0] = Some(spec);
    }

    /// Register and fill in one step.
    pub fn insert(&mut self, name: &str, spec: VSpec) -> SpecId {
        let id = self.register(name);
        self.fill(id, spec);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<SpecId> {
        self.index.get(name).copied()
    }

    pub fn resolve(&self, id: SpecId) -> Option<&VSpec> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get(&self, name: &str) -> Option<&VSpec> {
        self.id_of(name).and_then(|id| self.resolve(id))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Filled entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VSpec)> {
        self.names
            .iter()
            .zip(&self.slots)
            .filter_map(|(name, slot)| slot.as_ref().map(|spec| (name.as_str(), spec)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reference targets used somewhere in the table that have no filled
    /// entry, deduplicated, in first-seen order.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for (_, spec) in self.iter() {
            spec.for_each_reference(&mut |name| {
                if !self.contains(name) && !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
            });
        }
        missing
    }
}
