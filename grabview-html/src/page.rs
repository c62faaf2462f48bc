//! Page objects: schemas of named node-selecting fields.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use grabview_core::{
    BoxError, DYNAMIC_PREFIX, FieldConfig, FieldSet, MemberKind, Record, SchemaError, Value,
    ViewError, classify,
};
use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::document::Node;
use crate::field::Field;

type NodeFn = dyn for<'a> Fn(Node<'a>) -> Result<Value, BoxError> + Send + Sync;
type PropertyFn = dyn for<'p, 'a> Fn(&'p Page<'a>) -> Result<Value, ViewError> + Send + Sync;

/// A declared member of a [`PageSchema`].
#[derive(Clone)]
pub enum PageMember {
    Field(Field),
    /// Function of the page's root node. Exported when named `attr_<name>`.
    Callable(Arc<NodeFn>),
    /// Computed from the page itself, typically from other (internal) fields.
    Property(Arc<PropertyFn>),
    Constant(Value),
    /// An inner schema declaration.
    Nested(Arc<PageSchema>),
}

impl PageMember {
    fn kind(&self) -> MemberKind {
        match self {
            PageMember::Field(_) => MemberKind::Descriptor,
            PageMember::Callable(_) => MemberKind::Callable,
            PageMember::Property(_) | PageMember::Constant(_) => MemberKind::Attribute,
            PageMember::Nested(_) => MemberKind::NestedType,
        }
    }
}

impl fmt::Debug for PageMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMember::Field(field) => fmt::Debug::fmt(field, f),
            PageMember::Callable(_) => f.write_str("Callable(..)"),
            PageMember::Property(_) => f.write_str("Property(..)"),
            PageMember::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            PageMember::Nested(s) => f.debug_tuple("Nested").field(&s.name).finish(),
        }
    }
}

/// A finalized page-object schema.
///
/// ```
/// use grabview_html::{Document, Field, PageSchema, inner_text, stripped};
/// use grabview_core::Value;
///
/// let schema = PageSchema::builder("Greeting")
///     .field("paragraph", Field::select("p").then(inner_text()).then(stripped()))
///     .build()
///     .unwrap();
///
/// let doc = Document::parse("<p> Hello, world! </p>");
/// let page = doc.page(&schema);
/// assert_eq!(page.get("paragraph").unwrap(), Value::from("Hello, world!"));
/// ```
#[derive(Debug)]
pub struct PageSchema {
    name: String,
    members: IndexMap<String, PageMember>,
    fields: FieldSet,
}

impl PageSchema {
    pub fn builder(name: impl Into<String>) -> PageSchemaBuilder {
        PageSchemaBuilder {
            name: name.into(),
            members: Vec::new(),
            config: FieldConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The exported field set, fixed when the schema was built.
    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn member(&self, name: &str) -> Option<&PageMember> {
        self.members.get(name)
    }

    pub fn nested(&self, name: &str) -> Option<&Arc<PageSchema>> {
        match self.members.get(name) {
            Some(PageMember::Nested(schema)) => Some(schema),
            _ => None,
        }
    }
}

/// Collects members and field configuration for a [`PageSchema`].
pub struct PageSchemaBuilder {
    name: String,
    members: Vec<(String, PageMember)>,
    config: FieldConfig,
}

impl PageSchemaBuilder {
    pub fn member(mut self, name: impl Into<String>, member: PageMember) -> Self {
        self.members.push((name.into(), member));
        self
    }

    pub fn field(self, name: impl Into<String>, field: Field) -> Self {
        self.member(name, PageMember::Field(field))
    }

    pub fn callable<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(Node<'a>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.member(name, PageMember::Callable(Arc::new(f)))
    }

    pub fn property<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'p, 'a> Fn(&'p Page<'a>) -> Result<Value, ViewError> + Send + Sync + 'static,
    {
        self.member(name, PageMember::Property(Arc::new(f)))
    }

    pub fn constant(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.member(name, PageMember::Constant(value.into()))
    }

    pub fn nested(self, name: impl Into<String>, schema: Arc<PageSchema>) -> Self {
        self.member(name, PageMember::Nested(schema))
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

    /// Validates selectors and classifies members into exported fields.
    pub fn build(self) -> Result<Arc<PageSchema>, SchemaError> {
        let mut members = IndexMap::with_capacity(self.members.len());
        for (name, member) in self.members {
            if members.contains_key(&name) {
                return Err(SchemaError::DuplicateMember {
                    schema: self.name,
                    member: name,
                });
            }
            if let PageMember::Field(field) = &member {
                field.validate()?;
            }
            members.insert(name, member);
        }

        let fields = classify(
            &self.name,
            members.iter().map(|(name, m): (&String, &PageMember)| (name.as_str(), m.kind())),
            &self.config,
        )?;
        debug!(schema = %self.name, fields = ?fields.exported().collect::<Vec<_>>(), "page schema finalized");

        Ok(Arc::new(PageSchema {
            name: self.name,
            members,
            fields,
        }))
    }
}

/// A page object: a [`PageSchema`] bound to one node of a document.
///
/// The record is assembled once, on the first [`Page::as_dict`], and reused
/// afterwards; individual reads through [`Page::get`] stay live unless the
/// field is memoized. A page is meant for a single owner and is not `Sync`.
pub struct Page<'a> {
    schema: Arc<PageSchema>,
    root: Node<'a>,
    memo: RefCell<HashMap<String, Value>>,
    record: OnceCell<Record>,
}

impl<'a> Page<'a> {
    pub fn new(schema: &Arc<PageSchema>, root: Node<'a>) -> Self {
        Page {
            schema: Arc::clone(schema),
            root,
            memo: RefCell::new(HashMap::new()),
            record: OnceCell::new(),
        }
    }

    pub fn schema(&self) -> &Arc<PageSchema> {
        &self.schema
    }

    /// The node this page wraps.
    pub fn node(&self) -> Node<'a> {
        self.root
    }

    /// Reads one member by name, internal members included.
    ///
    /// A dynamic callable answers to its prefixed member name and to the
    /// stripped name, whether or not the field configuration exports it.
    pub fn get(&self, name: &str) -> Result<Value, ViewError> {
        let (key, member) = match self.schema.members.get_key_value(name) {
            Some(entry) => entry,
            None => match self
                .schema
                .members
                .get_key_value(format!("{DYNAMIC_PREFIX}{name}").as_str())
            {
                Some(entry @ (_, PageMember::Callable(_))) => entry,
                _ => return Err(self.unknown(name)),
            },
        };

        match member {
            PageMember::Field(field) if field.is_memoized() => {
                if let Some(value) = self.memo.borrow().get(key) {
                    return Ok(value.clone());
                }
                let value = field.evaluate(self.root)?;
                self.memo.borrow_mut().insert(key.clone(), value.clone());
                Ok(value)
            }
            PageMember::Field(field) => field.evaluate(self.root),
            PageMember::Callable(f) => f(self.root).map_err(ViewError::Coercion),
            PageMember::Property(f) => f(self),
            PageMember::Constant(value) => Ok(value.clone()),
            PageMember::Nested(_) => Err(ViewError::TypeMismatch {
                expected: "field",
                found: format!("nested schema `{name}`"),
            }),
        }
    }

    /// Materializes every exported field into a record, once per page.
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

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("schema", &self.schema.name)
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::transform::inner_text;

    #[test]
    fn memoized_fields_are_cached_per_page() {
        let schema = PageSchema::builder("Memo")
            .field("title", Field::select("h1").then(inner_text()).memoized())
            .build()
            .unwrap();
        let doc = Document::parse("<h1>Title</h1>");
        let page = doc.page(&schema);
        assert_eq!(page.get("title").unwrap(), Value::from("Title"));
        assert_eq!(page.memo.borrow().len(), 1);
        assert_eq!(page.get("title").unwrap(), Value::from("Title"));
    }

    #[test]
    fn invalid_selector_fails_build() {
        let err = PageSchema::builder("Broken")
            .field("bad", Field::select("div[["))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSelector { .. }));
    }

    #[test]
    fn callable_members_receive_root() {
        let schema = PageSchema::builder("Root")
            .callable("attr_tag", |node| Ok(Value::from(node.tag())))
            .callable("helper", |_| Ok(Value::Null))
            .build()
            .unwrap();
        let doc = Document::parse("<p>x</p>");
        let page = doc.page(&schema);
        let record = page.as_dict().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["tag"], Value::from("html"));
        assert_eq!(page.get("helper").unwrap(), Value::Null);
    }

    #[test]
    fn ignored_dynamic_field_reads_by_either_name() {
        let schema = PageSchema::builder("Hidden")
            .callable("attr_tag", |node| Ok(Value::from(node.tag())))
            .ignore_fields(["tag"])
            .build()
            .unwrap();
        let doc = Document::parse("<p>x</p>");
        let page = doc.page(&schema);
        assert!(page.as_dict().unwrap().is_empty());
        assert_eq!(page.get("tag").unwrap(), Value::from("html"));
        assert_eq!(page.get("attr_tag").unwrap(), Value::from("html"));
    }

    #[test]
    fn dynamic_member_cannot_shadow_field() {
        let err = PageSchema::builder("Shadow")
            .field("tag", Field::select("p"))
            .callable("attr_tag", |node| Ok(Value::from(node.tag())))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateMember { ref member, .. } if member == "tag"));
    }

    #[test]
    fn unknown_member() {
        let schema = PageSchema::builder("Empty").build().unwrap();
        let doc = Document::parse("");
        assert!(matches!(
            doc.page(&schema).get("nothing"),
            Err(ViewError::UnknownField { .. })
        ));
    }
}
