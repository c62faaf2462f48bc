//! Object views: schemas of named projections over generic nested data.

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::error::{BoxError, SchemaError, ViewError};
use crate::introspect::{DYNAMIC_PREFIX, FieldConfig, FieldSet, MemberKind, classify};
use crate::project::Project;
use crate::value::{Record, Value};

type CallableFn = dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync;
type PropertyFn = dyn Fn(&ObjectView) -> Result<Value, ViewError> + Send + Sync;

/// A declared member of a [`ViewSchema`].
#[derive(Clone)]
pub enum ViewMember {
    Project(Project),
    /// Function of the raw data. Exported when named `attr_<name>`.
    Callable(Arc<CallableFn>),
    /// Computed from the view itself.
    Property(Arc<PropertyFn>),
    Constant(Value),
    /// An inner schema declaration.
    Nested(Arc<ViewSchema>),
}

impl ViewMember {
    fn kind(&self) -> MemberKind {
        match self {
            ViewMember::Project(_) => MemberKind::Descriptor,
            ViewMember::Callable(_) => MemberKind::Callable,
            ViewMember::Property(_) | ViewMember::Constant(_) => MemberKind::Attribute,
            ViewMember::Nested(_) => MemberKind::NestedType,
        }
    }
}

impl fmt::Debug for ViewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMember::Project(p) => fmt::Debug::fmt(p, f),
            ViewMember::Callable(_) => f.write_str("Callable(..)"),
            ViewMember::Property(_) => f.write_str("Property(..)"),
            ViewMember::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            ViewMember::Nested(s) => f.debug_tuple("Nested").field(&s.name).finish(),
        }
    }
}

/// A finalized object-view schema.
///
/// Built once through [`ViewSchema::builder`]; the exported field set is
/// computed at [`ViewSchemaBuilder::build`] and never changes afterwards.
#[derive(Debug)]
pub struct ViewSchema {
    name: String,
    members: IndexMap<String, ViewMember>,
    fields: FieldSet,
}

impl ViewSchema {
    pub fn builder(name: impl Into<String>) -> ViewSchemaBuilder {
        ViewSchemaBuilder {
            name: name.into(),
            members: Vec::new(),
            config: FieldConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn member(&self, name: &str) -> Option<&ViewMember> {
        self.members.get(name)
    }

    /// An inner schema declared on this one.
    pub fn nested(&self, name: &str) -> Option<&Arc<ViewSchema>> {
        match self.members.get(name) {
            Some(ViewMember::Nested(schema)) => Some(schema),
            _ => None,
        }
    }
}

/// Collects members and field configuration for a [`ViewSchema`].
pub struct ViewSchemaBuilder {
    name: String,
    members: Vec<(String, ViewMember)>,
    config: FieldConfig,
}

impl ViewSchemaBuilder {
    pub fn member(mut self, name: impl Into<String>, member: ViewMember) -> Self {
        self.members.push((name.into(), member));
        self
    }

    pub fn project(self, name: impl Into<String>, project: Project) -> Self {
        self.member(name, ViewMember::Project(project))
    }

    pub fn callable<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.member(name, ViewMember::Callable(Arc::new(f)))
    }

    pub fn property<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ObjectView) -> Result<Value, ViewError> + Send + Sync + 'static,
    {
        self.member(name, ViewMember::Property(Arc::new(f)))
    }

    pub fn constant(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.member(name, ViewMember::Constant(value.into()))
    }

    pub fn nested(self, name: impl Into<String>, schema: Arc<ViewSchema>) -> Self {
        self.member(name, ViewMember::Nested(schema))
    }

    /// Allow-list of exported names.
    pub fn fields<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Deny-list of exported names.
    pub fn ignore_fields<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.ignore_fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Finalizes the schema, classifying members into exported fields.
    pub fn build(self) -> Result<Arc<ViewSchema>, SchemaError> {
        let mut members = IndexMap::with_capacity(self.members.len());
        for (name, member) in self.members {
            if members.contains_key(&name) {
                return Err(SchemaError::DuplicateMember {
                    schema: self.name,
                    member: name,
                });
            }
            members.insert(name, member);
        }

        let fields = classify(
            &self.name,
            members.iter().map(|(name, m): (&String, &ViewMember)| (name.as_str(), m.kind())),
            &self.config,
        )?;
        debug!(schema = %self.name, fields = ?fields.exported().collect::<Vec<_>>(), "view schema finalized");

        Ok(Arc::new(ViewSchema {
            name: self.name,
            members,
            fields,
        }))
    }
}

/// An instance of a [`ViewSchema`] over one data value.
///
/// Field reads are recomputed on every access; the full record is computed
/// once, on the first [`ObjectView::as_dict`], and cached. Not `Sync`: the
/// record cache is filled lazily.
pub struct ObjectView {
    schema: Arc<ViewSchema>,
    data: Value,
    record: OnceCell<Record>,
}

impl ObjectView {
    pub fn new(schema: &Arc<ViewSchema>, data: Value) -> Self {
        ObjectView {
            schema: Arc::clone(schema),
            data,
            record: OnceCell::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ViewSchema> {
        &self.schema
    }

    /// The wrapped data.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Reads one member by name.
    ///
    /// Like every member, a dynamic callable is readable whether or not the
    /// field configuration exports it, under its prefixed member name and
    /// under the stripped name alike.
    pub fn get(&self, name: &str) -> Result<Value, ViewError> {
        let member = match self.schema.members.get(name) {
            Some(member) => member,
            None => match self.schema.members.get(&format!("{DYNAMIC_PREFIX}{name}")) {
                Some(member @ ViewMember::Callable(_)) => member,
                _ => return Err(self.unknown(name)),
            },
        };

        match member {
            ViewMember::Project(project) => project.evaluate(&self.data),
            ViewMember::Callable(f) => f(&self.data).map_err(ViewError::Coercion),
            ViewMember::Property(f) => f(self),
            ViewMember::Constant(value) => Ok(value.clone()),
            ViewMember::Nested(_) => Err(ViewError::TypeMismatch {
                expected: "field",
                found: format!("nested schema `{name}`"),
            }),
        }
    }

    /// Materializes every exported field into a record, once per instance.
    #[instrument(level = "debug", skip(self), fields(schema = %self.schema.name))]
    pub fn as_dict(&self) -> Result<&Record, ViewError> {
        if let Some(record) = self.record.get() {
            return Ok(record);
        }
        let mut record = Record::with_capacity(self.schema.fields.len());
        for (exported, member) in self.schema.fields.entries() {
            record.insert(exported.to_string(), self.get(member)?);
        }
        Ok(self.record.get_or_init(|| record))
    }

    fn unknown(&self, name: &str) -> ViewError {
        ViewError::UnknownField {
            schema: self.schema.name.clone(),
            name: name.to_string(),
        }
    }
}

impl fmt::Debug for ObjectView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectView")
            .field("schema", &self.schema.name)
            .field("data", &self.data)
            .finish()
    }
}
