//! Transform chains applied to matched nodes.
//!
//! A chain is folded left to right, each transform consuming the previous
//! result. Returning [`Value::Absent`] ends the chain early.

use std::fmt;
use std::sync::Arc;

use grabview_core::{BoxError, Record, SchemaError, Value, ViewError};

use crate::document::Node;
use crate::field::Field;
use crate::page::{Page, PageSchema};

/// Intermediate result of a transform chain.
#[derive(Debug, Clone)]
pub enum Extracted<'a> {
    Node(Node<'a>),
    Value(Value),
}

impl<'a> Extracted<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Extracted::Value(Value::Absent))
    }

    /// Final value of a chain. A bare node becomes its outer HTML.
    pub fn into_value(self) -> Value {
        match self {
            Extracted::Node(node) => Value::Str(node.html()),
            Extracted::Value(value) => value,
        }
    }

    /// Value-level view: a node is seen through its text content.
    pub fn into_text(self) -> Value {
        match self {
            Extracted::Node(node) => Value::Str(node.text()),
            Extracted::Value(value) => value,
        }
    }

    fn expect_node(self, transform: &'static str) -> Result<Node<'a>, ViewError> {
        match self {
            Extracted::Node(node) => Ok(node),
            Extracted::Value(value) => Err(ViewError::TypeMismatch {
                expected: "node",
                found: format!("{} passed to {transform}", value.kind()),
            }),
        }
    }
}

impl From<Value> for Extracted<'_> {
    fn from(value: Value) -> Self {
        Extracted::Value(value)
    }
}

/// One step of a transform chain.
pub trait Transform: Send + Sync {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError>;

    /// Checks definition-time configuration, such as selectors of inner fields.
    fn validate(&self) -> Result<(), SchemaError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct InnerText;

impl Transform for InnerText {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        Ok(Extracted::Value(input.into_text()))
    }

    fn name(&self) -> &'static str {
        "inner_text"
    }
}

/// Text of the node and all its descendants.
pub fn inner_text() -> InnerText {
    InnerText
}

pub struct OwnText;

impl Transform for OwnText {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        Ok(Extracted::Value(Value::Str(input.expect_node("own_text")?.own_text())))
    }

    fn name(&self) -> &'static str {
        "own_text"
    }
}

/// Text of the node's direct text children.
pub fn own_text() -> OwnText {
    OwnText
}

pub struct Stripped;

impl Transform for Stripped {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        Ok(match input.into_text() {
            Value::Str(s) => Value::Str(s.trim().to_string()),
            other => other,
        }
        .into())
    }

    fn name(&self) -> &'static str {
        "stripped"
    }
}

/// Trims surrounding whitespace from text.
pub fn stripped() -> Stripped {
    Stripped
}

pub struct Attr(String);

impl Transform for Attr {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        let node = input.expect_node("as_attr")?;
        Ok(Value::from(node.attr(&self.0)).into())
    }

    fn name(&self) -> &'static str {
        "as_attr"
    }
}

/// Value of the named attribute, or null when the node lacks it.
pub fn as_attr(name: impl Into<String>) -> Attr {
    Attr(name.into())
}

pub struct ParseHref;

impl Transform for ParseHref {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        let node = input.expect_node("parse_href")?;
        let mut link = Record::new();
        link.insert("href".into(), Value::from(node.attr("href")));
        link.insert("label".into(), Value::Str(node.text().trim().to_string()));
        Ok(Value::Map(link).into())
    }

    fn name(&self) -> &'static str {
        "parse_href"
    }
}

/// `{href, label}` of a link.
pub fn parse_href() -> ParseHref {
    ParseHref
}

pub struct ParseImg;

impl Transform for ParseImg {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        let node = input.expect_node("parse_img")?;
        let mut image = Record::new();
        image.insert("src".into(), Value::from(node.attr("src")));
        image.insert("label".into(), Value::from(node.attr("alt")));
        Ok(Value::Map(image).into())
    }

    fn name(&self) -> &'static str {
        "parse_img"
    }
}

/// `{src, label}` of an image, the label taken from `alt`.
pub fn parse_img() -> ParseImg {
    ParseImg
}

pub struct Prepend(String);

impl Transform for Prepend {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        match input.into_text() {
            Value::Str(s) => Ok(Value::Str(format!("{}{s}", self.0)).into()),
            other => Err(ViewError::TypeMismatch {
                expected: "string",
                found: other.kind().to_string(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "prepend"
    }
}

/// Prefixes text, e.g. a base URL before a relative link.
pub fn prepend(prefix: impl Into<String>) -> Prepend {
    Prepend(prefix.into())
}

pub struct Nested(Arc<PageSchema>);

impl Transform for Nested {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        let node = input.expect_node("nested")?;
        let page = Page::new(&self.0, node);
        Ok(Value::Map(page.as_dict()?.clone()).into())
    }

    fn name(&self) -> &'static str {
        "nested"
    }
}

/// Wraps the node in a page object of `schema` and materializes its record.
pub fn nested(schema: Arc<PageSchema>) -> Nested {
    Nested(schema)
}

pub struct List(Field);

impl Transform for List {
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        let node = input.expect_node("list")?;
        Ok(self.0.evaluate(node)?.into())
    }

    fn validate(&self) -> Result<(), SchemaError> {
        self.0.validate()
    }

    fn name(&self) -> &'static str {
        "list"
    }
}

/// Evaluates `field` against the matched node, expanding a group node into
/// its own list of results.
pub fn list(field: Field) -> List {
    List(field)
}

pub struct MapValue<F>(F);

impl<F> Transform for MapValue<F>
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync,
{
    fn apply<'a>(&self, input: Extracted<'a>) -> Result<Extracted<'a>, ViewError> {
        (self.0)(input.into_text())
            .map(Extracted::Value)
            .map_err(ViewError::Coercion)
    }

    fn name(&self) -> &'static str {
        "map"
    }
}

/// Applies a value function; nodes are passed as their text.
pub fn map<F>(f: F) -> MapValue<F>
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync,
{
    MapValue(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use scraper::Selector;

    fn anchor(doc: &Document) -> Node<'_> {
        doc.root()
            .select_one(&Selector::parse("a").unwrap())
            .unwrap()
    }

    #[test]
    fn href_record() {
        let doc = Document::parse(r#"<a href="https://example.org/"> Example </a>"#);
        let out = parse_href().apply(Extracted::Node(anchor(&doc))).unwrap();
        assert_eq!(
            out.into_value(),
            Value::map([("href", "https://example.org/"), ("label", "Example")])
        );
    }

    #[test]
    fn missing_attribute_is_null() {
        let doc = Document::parse(r#"<a>x</a>"#);
        let out = as_attr("href").apply(Extracted::Node(anchor(&doc))).unwrap();
        assert_eq!(out.into_value(), Value::Null);
    }

    #[test]
    fn value_transforms_see_text() {
        let doc = Document::parse(r#"<a href="/p">  path </a>"#);
        let text = stripped().apply(Extracted::Node(anchor(&doc))).unwrap();
        let joined = prepend("https://host").apply(text).unwrap();
        assert_eq!(joined.into_value(), Value::from("https://hostpath"));
    }

    #[test]
    fn node_transforms_reject_values() {
        let err = as_attr("href").apply(Extracted::Value(Value::from("x"))).unwrap_err();
        assert!(matches!(err, ViewError::TypeMismatch { expected: "node", .. }));
    }

    #[test]
    fn map_errors_pass_through() {
        let fail = map(|_| Err("bad value".into()));
        let err = fail.apply(Extracted::Value(Value::Null)).unwrap_err();
        assert_eq!(err.to_string(), "bad value");
    }
}
