/// Validation engine: walks a value against a `VSpec` and collects every
/// violation instead of stopping at the first one.
///
/// Each top-level call owns a `Session` holding the current location, the
/// chain of references being followed, the collected violations, and the
/// set of containers currently being validated through a reference. That
/// set is what lets cyclic data terminate: a container reached again
/// through a reference while it is already on the stack is assumed
/// consistent.
use crate::instance::{Instance, ValueKind};
use crate::vspec::{Field, PrimitiveKind, SpecTable, VSpec};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Category of a collected violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationKind {
    TypeMismatch,
    MissingRequired,
    UnexpectedProperty,
    EnumMismatch,
}

/// One step into a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Location of a value relative to the validated root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(pub Vec<Segment>);

impl Path {
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    /// Renders like `tags[0].id`; the root is `(root)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Index(idx) => write!(f, "[{idx}]")?,
                Segment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                Segment::Key(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn primitive_accepts(kind: PrimitiveKind, found: ValueKind) -> bool {
    matches!(
        (kind, found),
        (PrimitiveKind::String, ValueKind::String)
            | (PrimitiveKind::Number, ValueKind::Number)
            | (PrimitiveKind::Boolean, ValueKind::Boolean)
            | (PrimitiveKind::Object, ValueKind::Object)
    )
}

/// How a field is named in messages about its value.
fn subject(field: &Field) -> String {
    match &field.spec {
        VSpec::Reference { name } => format!("{name} (referenced as \"{}\")", field.name),
        _ => field.name.clone(),
    }
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// One nonconformance between a value and a spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub path: Path,
    /// References followed to get here, outermost first, e.g.
    /// `Tag (index 0 in array)`.
    pub via: Vec<String>,
    pub message: String,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(innermost) = self.via.last() {
            write!(f, " (via {innermost})")?;
        }
        Ok(())
    }
}

/// Broken specs. Bad data never produces one of these.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("No reference \"{name}\" found (at {path})")]
    UnresolvedReference { name: String, path: Path },
}

/// Mutable state of one top-level validation call.
#[derive(Default)]
struct Session {
    path: Vec<Segment>,
    via: Vec<String>,
    visited: HashSet<usize>,
    violations: Vec<Violation>,
}

impl Session {
    /// A session whose root container already counts as visited, so a
    /// reference leading back to it is not checked a second time.
    fn rooted<I: Instance>(value: &I) -> Session {
        let mut session = Session::default();
        if let Some(id) = value.identity() {
            session.visited.insert(id);
        }
        session
    }

    fn report(&mut self, kind: ViolationKind, message: String) {
        self.violations.push(Violation {
            path: Path(self.path.clone()),
            via: self.via.clone(),
            message,
            kind,
        });
    }

    fn report_at(&mut self, segment: Segment, kind: ViolationKind, message: String) {
        self.path.push(segment);
        self.report(kind, message);
        self.path.pop();
    }

    fn location(&self) -> Path {
        Path(self.path.clone())
    }
}

/// Validates values against compiled specs, resolving references through
/// a shared table.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'t> {
    table: &'t SpecTable,
}

impl<'t> Validator<'t> {
    pub fn new(table: &'t SpecTable) -> Self {
        Self { table }
    }

    /// Validate `value` against `spec`. An empty result means it conforms.
    pub fn validate<I: Instance>(
        &self,
        spec: &VSpec,
        value: &I,
    ) -> Result<Vec<Violation>, ValidateError> {
        // A root reference marks the value itself on the way in.
        let mut session = match spec {
            VSpec::Reference { .. } => Session::default(),
            _ => Session::rooted(value),
        };
        self.descend(&mut session, spec, value)?;
        Ok(session.violations)
    }

    /// Validate `value` against the named table entry.
    pub fn validate_definition<I: Instance>(
        &self,
        name: &str,
        value: &I,
    ) -> Result<Vec<Violation>, ValidateError> {
        let spec = self.lookup(name, &Session::default())?;
        self.validate(spec, value)
    }

    /// Validate `value` as if it were the only property `name` of an
    /// object whose shape is exactly `fields`: undeclared keys are
    /// reported, and paths start at `name`.
    pub fn check_exact<I: Instance>(
        &self,
        name: &str,
        fields: &[Field],
        value: &I,
    ) -> Result<Vec<Violation>, ValidateError> {
        let mut session = Session::rooted(value);
        session.path.push(Segment::Key(name.to_string()));
        self.descend_shape(&mut session, fields, true, value)?;
        Ok(session.violations)
    }

    /// `check_exact` against a named table entry's fields. Entries that are
    /// not shapes are validated as they are.
    pub fn check_exact_definition<I: Instance>(
        &self,
        name: &str,
        value: &I,
    ) -> Result<Vec<Violation>, ValidateError> {
        match self.lookup(name, &Session::default())? {
            VSpec::Shape { fields, .. } => self.check_exact(name, fields, value),
            other => {
                let mut session = Session::rooted(value);
                session.path.push(Segment::Key(name.to_string()));
                self.descend(&mut session, other, value)?;
                Ok(session.violations)
            }
        }
    }

    fn lookup(&self, name: &str, session: &Session) -> Result<&'t VSpec, ValidateError> {
        self.table
            .get(name)
            .ok_or_else(|| ValidateError::UnresolvedReference {
                name: name.to_string(),
                path: session.location(),
            })
    }

    fn descend<I: Instance>(
        &self,
        session: &mut Session,
        spec: &VSpec,
        value: &I,
    ) -> Result<(), ValidateError> {
        match spec {
            VSpec::Primitive(kind) => {
                let found = value.kind();
                if !primitive_accepts(*kind, found) {
                    session.report(
                        ViolationKind::TypeMismatch,
                        format!("expected {kind}, found {found}"),
                    );
                }
                Ok(())
            }

            VSpec::Enum { allowed } => {
                if !allowed.iter().any(|literal| value.equals_literal(literal)) {
                    let expected: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
                    session.report(
                        ViolationKind::EnumMismatch,
                        format!(
                            "value {} is not one of [{}]",
                            value.preview(),
                            expected.join(", ")
                        ),
                    );
                }
                Ok(())
            }

            VSpec::Array { item } => {
                let found = value.kind();
                if found != ValueKind::Array {
                    session.report(
                        ViolationKind::TypeMismatch,
                        format!("expected array, found {found}"),
                    );
                    return Ok(());
                }
                value.try_for_each_element(|i, element| {
                    session.path.push(Segment::Index(i));
                    let result = self.descend(session, item, element);
                    session.path.pop();
                    result
                })
            }

            VSpec::Shape { fields, exact } => self.descend_shape(session, fields, *exact, value),

            VSpec::Map { value: value_spec } => {
                let found = value.kind();
                if found != ValueKind::Object {
                    session.report(
                        ViolationKind::TypeMismatch,
                        format!("expected object, found {found}"),
                    );
                    return Ok(());
                }
                value.try_for_each_entry(|key, entry| {
                    session.path.push(Segment::Key(key.to_string()));
                    let result = self.descend(session, value_spec, entry);
                    session.path.pop();
                    result
                })
            }

            VSpec::Reference { name } => self.descend_reference(session, name, value),
        }
    }

    fn descend_shape<I: Instance>(
        &self,
        session: &mut Session,
        fields: &[Field],
        exact: bool,
        value: &I,
    ) -> Result<(), ValidateError> {
        let found = value.kind();
        if found != ValueKind::Object {
            session.report(
                ViolationKind::TypeMismatch,
                format!("expected object, found {found}"),
            );
            return Ok(());
        }

        for field in fields {
            value.with_field(&field.name, |child| match child {
                None => {
                    if field.required {
                        session.report_at(
                            Segment::Key(field.name.clone()),
                            ViolationKind::MissingRequired,
                            format!("required property `{}` is missing", field.name),
                        );
                    }
                    Ok(())
                }
                Some(child) if child.kind() == ValueKind::Null => {
                    if field.required {
                        session.report_at(
                            Segment::Key(field.name.clone()),
                            ViolationKind::MissingRequired,
                            format!(
                                "`{}` is required, but its value is `null`",
                                subject(field)
                            ),
                        );
                    }
                    Ok(())
                }
                Some(child) => {
                    session.path.push(Segment::Key(field.name.clone()));
                    let result = self.descend(session, &field.spec, child);
                    session.path.pop();
                    result
                }
            })?;
        }

        if exact {
            for key in value.keys() {
                if !fields.iter().any(|field| field.name == key) {
                    let message = format!("unexpected property `{key}`");
                    session.report_at(Segment::Key(key), ViolationKind::UnexpectedProperty, message);
                }
            }
        }
        Ok(())
    }

    fn descend_reference<I: Instance>(
        &self,
        session: &mut Session,
        name: &str,
        value: &I,
    ) -> Result<(), ValidateError> {
        let target = self.lookup(name, session)?;

        let description = match session.path.last() {
            Some(Segment::Index(i)) => format!("{name} (index {i} in array)"),
            Some(Segment::Key(key)) => format!("{name} (referenced as \"{key}\")"),
            None => name.to_string(),
        };

        // Required fields are checked by the enclosing shape; elsewhere a
        // null reference is accepted.
        let found = value.kind();
        if found == ValueKind::Null {
            return Ok(());
        }
        if !found.is_container() {
            session.report(
                ViolationKind::TypeMismatch,
                format!(
                    "`{description}` can't be a primitive value ({})",
                    value.preview()
                ),
            );
            return Ok(());
        }

        // Already being validated further up this descent: assume it is
        // consistent and do not re-enter.
        let identity = value.identity();
        if let Some(id) = identity {
            if !session.visited.insert(id) {
                return Ok(());
            }
        }

        session.via.push(description);
        let result = self.descend(session, target, value);
        session.via.pop();

        if let Some(id) = identity {
            session.visited.remove(&id);
        }
        result
    }
}

/// Validate `value` against `spec`, resolving references in `table`.
pub fn validate<I: Instance>(
    table: &SpecTable,
    spec: &VSpec,
    value: &I,
) -> Result<Vec<Violation>, ValidateError> {
    Validator::new(table).validate(spec, value)
}

/// `Validator::check_exact` over `table`.
pub fn check_exact<I: Instance>(
    table: &SpecTable,
    name: &str,
    fields: &[Field],
    value: &I,
) -> Result<Vec<Violation>, ValidateError> {
    Validator::new(table).check_exact(name, fields, value)
}
