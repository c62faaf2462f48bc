//! HTML page objects for Grabview, backed by `scraper`.
//!
//! A [`PageSchema`] declares named [`Field`]s, each a CSS selector plus a
//! transform chain. Wrapping a parsed [`Document`] in a [`Page`] evaluates
//! the fields lazily and materializes them into a record.
//!
//! # Example
//!
//! ```
//! use grabview_html::{Document, Field, PageSchema, as_attr, inner_text, nested};
//! use grabview_core::Value;
//!
//! let language = PageSchema::builder("Language")
//!     .field("href", Field::this().then(as_attr("href")))
//!     .field("label", Field::this().then(inner_text()))
//!     .build()
//!     .unwrap();
//!
//! let page_schema = PageSchema::builder("Languages")
//!     .field("languages", Field::select("a").then(nested(language)).many())
//!     .build()
//!     .unwrap();
//!
//! let doc = Document::parse(r#"<a href="http://ada">Ada</a><a href="http://go">Go</a>"#);
//! let page = doc.page(&page_schema);
//! let record = page.as_dict().unwrap();
//! assert_eq!(
//!     record["languages"],
//!     Value::seq([
//!         Value::map([("href", "http://ada"), ("label", "Ada")]),
//!         Value::map([("href", "http://go"), ("label", "Go")]),
//!     ])
//! );
//! ```

mod document;
mod field;
mod page;
pub mod transform;

pub use document::{Document, Node};
pub use field::Field;
pub use page::{Page, PageMember, PageSchema, PageSchemaBuilder};
pub use transform::{
    Extracted, Transform, as_attr, inner_text, list, map, nested, own_text, parse_href, parse_img,
    prepend, stripped,
};
