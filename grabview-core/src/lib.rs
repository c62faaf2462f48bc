//! Grabview extracts structured records from semi-structured data.
//!
//! Core concepts:
//! - **Value**: a node of nested data, tagged by container shape once at the boundary
//! - **Step**: one navigation step (key, index or pattern)
//! - **Cursor**: a navigable view that resolves misses to `Value::Absent`
//! - **Project**: a declarative projection (path, zip or call) with an optional coercion
//! - **ViewSchema**: named projections whose exported field set is fixed at build time
//! - **ObjectView**: a schema instance over one value, materialized into a `Record`
//!
//! # Example
//!
//! ```
//! use grabview_core::{ObjectView, Project, Value, ViewSchema};
//!
//! let schema = ViewSchema::builder("Transpose")
//!     .project(
//!         "pairs",
//!         Project::zip([Project::dotted("current.fields"), Project::dotted("current.values")]),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let data = Value::map([(
//!     "current",
//!     Value::map([("fields", Value::seq(["a", "b"])), ("values", Value::seq([1, 2]))]),
//! )]);
//! let view = ObjectView::new(&schema, data);
//! let record = view.as_dict().unwrap();
//! assert_eq!(
//!     record["pairs"],
//!     Value::seq([Value::seq([Value::from("a"), Value::from(1)]), Value::seq([Value::from("b"), Value::from(2)])])
//! );
//! ```

pub mod coerce;
mod cursor;
mod error;
mod introspect;
mod navigate;
mod project;
mod step;
mod value;
mod view;

pub use coerce::{Coerce, CoercionError};
pub use cursor::Cursor;
pub use error::{BoxError, SchemaError, ViewError};
pub use introspect::{DYNAMIC_PREFIX, FieldConfig, FieldSet, MemberKind, classify};
pub use navigate::{lookup, navigate};
pub use project::{Project, project};
pub use step::Step;
pub use value::{Opaque, Record, Value};
pub use view::{ObjectView, ViewMember, ViewSchema, ViewSchemaBuilder};
