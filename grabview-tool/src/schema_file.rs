//! Declarative schema files.
//!
//! A schema file is TOML with a `[schema]` table for the top-level schema and
//! optional `[schemas.<Name>]` tables that other members refer to by name.
//! Member order in the file is the field order of the record.
//!
//! ```toml
//! [schema]
//! ignore_fields = ["raw"]
//!
//! [schema.members.title]
//! select = "h1"
//! then = ["inner_text", "stripped"]
//!
//! [schema.members.links]
//! select = "a"
//! many = true
//! then = [{ nested = "Link" }]
//!
//! [schemas.Link.members.href]
//! then = [{ attr = "href" }]
//! ```
//!
//! HTML members use `select`, `many`, `memoized` and `then`; a member without
//! `select` reads the node itself. JSON members use `path` or `zip`, with
//! optional `strict`, `default` and `astype`. Either kind may be a `constant`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use grabview_core::{Coerce, Project, SchemaError, Value, ViewSchema, coerce};
use grabview_html::{
    Field, PageSchema, Transform, as_attr, inner_text, list, nested, own_text, parse_href,
    parse_img, prepend, stripped,
};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::ToolError;

const ROOT_NAME: &str = "Root";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    pub schema: SchemaDef,
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDef {
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub ignore_fields: Vec<String>,
    #[serde(default)]
    pub members: IndexMap<String, MemberDef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberDef {
    pub select: Option<String>,
    #[serde(default)]
    pub many: bool,
    #[serde(default)]
    pub memoized: bool,
    #[serde(default)]
    pub then: Vec<TransformDef>,

    pub path: Option<String>,
    pub zip: Option<Vec<String>>,
    #[serde(default)]
    pub strict: bool,
    pub default: Option<serde_json::Value>,
    pub astype: Option<CoerceDef>,

    pub constant: Option<serde_json::Value>,
}

impl MemberDef {
    fn has_html_keys(&self) -> bool {
        self.select.is_some() || self.many || self.memoized || !self.then.is_empty()
    }

    fn has_json_keys(&self) -> bool {
        self.path.is_some()
            || self.zip.is_some()
            || self.strict
            || self.default.is_some()
            || self.astype.is_some()
    }
}

/// A transform, either by name (`"inner_text"`) or with an argument
/// (`{ attr = "href" }`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TransformDef {
    Named(String),
    With(TransformArg),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformArg {
    Attr(String),
    Prepend(String),
    Nested(String),
    List(Box<MemberDef>),
}

/// A coercion, either by name (`"int"`) or a nested view (`{ view = "User" }`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CoerceDef {
    Named(String),
    View { view: String },
}

impl SchemaFile {
    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let content = std::fs::read_to_string(path).map_err(|source| ToolError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ToolError> {
        Ok(toml::from_str(content)?)
    }

    fn root_name(&self) -> &str {
        self.schema.name.as_deref().unwrap_or(ROOT_NAME)
    }

    /// Builds the top-level schema as an HTML page schema.
    pub fn page_schema(&self) -> Result<Arc<PageSchema>, ToolError> {
        Builder::new(self).page(self.root_name(), &self.schema)
    }

    /// Builds the top-level schema as a JSON object-view schema.
    pub fn view_schema(&self) -> Result<Arc<ViewSchema>, ToolError> {
        Builder::new(self).view(self.root_name(), &self.schema)
    }
}

/// Resolves named schema references, building each referenced schema once.
struct Builder<'f> {
    file: &'f SchemaFile,
    pages: HashMap<String, Arc<PageSchema>>,
    views: HashMap<String, Arc<ViewSchema>>,
    visiting: Vec<String>,
}

impl<'f> Builder<'f> {
    fn new(file: &'f SchemaFile) -> Self {
        Builder {
            file,
            pages: HashMap::new(),
            views: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    fn enter(&mut self, name: &str) -> Result<&'f SchemaDef, ToolError> {
        if self.visiting.iter().any(|n| n == name) {
            let mut chain = self.visiting.clone();
            chain.push(name.to_string());
            return Err(SchemaError::SchemaCycle(chain.join(" -> ")).into());
        }
        let file = self.file;
        let def = file
            .schemas
            .get(name)
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))?;
        self.visiting.push(name.to_string());
        Ok(def)
    }

    fn page_ref(&mut self, name: &str) -> Result<Arc<PageSchema>, ToolError> {
        if let Some(schema) = self.pages.get(name) {
            return Ok(Arc::clone(schema));
        }
        let def = self.enter(name)?;
        let schema = self.page(name, def)?;
        self.visiting.pop();
        self.pages.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn view_ref(&mut self, name: &str) -> Result<Arc<ViewSchema>, ToolError> {
        if let Some(schema) = self.views.get(name) {
            return Ok(Arc::clone(schema));
        }
        let def = self.enter(name)?;
        let schema = self.view(name, def)?;
        self.visiting.pop();
        self.views.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    fn page(&mut self, name: &str, def: &'f SchemaDef) -> Result<Arc<PageSchema>, ToolError> {
        let mut builder = PageSchema::builder(name);
        for (member, m) in &def.members {
            builder = match &m.constant {
                Some(value) => builder.constant(member, constant(name, member, m, value)?),
                None => builder.field(member, self.field(name, member, m)?),
            };
        }
        let schema = builder
            .fields(def.fields.iter().cloned())
            .ignore_fields(def.ignore_fields.iter().cloned())
            .build()?;
        debug!(schema = name, members = def.members.len(), "page schema loaded");
        Ok(schema)
    }

    fn view(&mut self, name: &str, def: &'f SchemaDef) -> Result<Arc<ViewSchema>, ToolError> {
        let mut builder = ViewSchema::builder(name);
        for (member, m) in &def.members {
            builder = match &m.constant {
                Some(value) => builder.constant(member, constant(name, member, m, value)?),
                None => builder.project(member, self.project(name, member, m)?),
            };
        }
        let schema = builder
            .fields(def.fields.iter().cloned())
            .ignore_fields(def.ignore_fields.iter().cloned())
            .build()?;
        debug!(schema = name, members = def.members.len(), "view schema loaded");
        Ok(schema)
    }

    fn field(&mut self, schema: &str, member: &str, def: &'f MemberDef) -> Result<Field, ToolError> {
        if def.has_json_keys() {
            return Err(invalid(
                schema,
                member,
                "`path`, `zip`, `strict`, `default` and `astype` apply to JSON schemas",
            ));
        }
        let mut field = match &def.select {
            Some(selector) => Field::select(selector.as_str()),
            None => Field::this(),
        };
        for transform in &def.then {
            field = field.then_shared(self.transform(schema, member, transform)?);
        }
        if def.many {
            field = field.many();
        }
        if def.memoized {
            field = field.memoized();
        }
        Ok(field)
    }

    fn transform(
        &mut self,
        schema: &str,
        member: &str,
        def: &'f TransformDef,
    ) -> Result<Arc<dyn Transform>, ToolError> {
        let transform: Arc<dyn Transform> = match def {
            TransformDef::Named(name) => match name.as_str() {
                "inner_text" => Arc::new(inner_text()),
                "own_text" => Arc::new(own_text()),
                "stripped" => Arc::new(stripped()),
                "parse_href" => Arc::new(parse_href()),
                "parse_img" => Arc::new(parse_img()),
                other => return Err(ToolError::UnknownTransform(other.to_string())),
            },
            TransformDef::With(TransformArg::Attr(attr)) => Arc::new(as_attr(attr.as_str())),
            TransformDef::With(TransformArg::Prepend(prefix)) => Arc::new(prepend(prefix.as_str())),
            TransformDef::With(TransformArg::Nested(name)) => Arc::new(nested(self.page_ref(name)?)),
            TransformDef::With(TransformArg::List(inner)) => {
                Arc::new(list(self.field(schema, member, inner)?))
            }
        };
        Ok(transform)
    }

    fn project(&mut self, schema: &str, member: &str, def: &'f MemberDef) -> Result<Project, ToolError> {
        if def.has_html_keys() {
            return Err(invalid(
                schema,
                member,
                "`select`, `many`, `memoized` and `then` apply to HTML schemas",
            ));
        }
        let mut project = match (&def.path, &def.zip) {
            (Some(path), None) => Project::dotted(path),
            (None, Some(paths)) => Project::zip(paths.iter().map(|p| Project::dotted(p))),
            (Some(_), Some(_)) => {
                return Err(invalid(schema, member, "`path` and `zip` are mutually exclusive"));
            }
            (None, None) => {
                return Err(invalid(schema, member, "expected `path`, `zip` or `constant`"));
            }
        };
        if def.strict {
            project = project.strict();
        }
        if let Some(default) = &def.default {
            project = project.default(Value::from(default.clone()));
        }
        if let Some(astype) = &def.astype {
            project = project.astype(self.coerce(astype)?);
        }
        Ok(project)
    }

    fn coerce(&mut self, def: &'f CoerceDef) -> Result<Coerce, ToolError> {
        Ok(match def {
            CoerceDef::Named(name) => match name.as_str() {
                "map" => coerce::to_map(),
                "bool" => coerce::to_bool(),
                "int" => coerce::to_int(),
                "float" => coerce::to_float(),
                "text" => coerce::to_text(),
                other => return Err(ToolError::UnknownCoercion(other.to_string())),
            },
            CoerceDef::View { view } => coerce::view(self.view_ref(view)?),
        })
    }
}

fn constant(
    schema: &str,
    member: &str,
    def: &MemberDef,
    value: &serde_json::Value,
) -> Result<Value, ToolError> {
    if def.has_html_keys() || def.has_json_keys() {
        return Err(invalid(schema, member, "`constant` cannot be combined with other keys"));
    }
    Ok(Value::from(value.clone()))
}

fn invalid(schema: &str, member: &str, reason: &str) -> ToolError {
    ToolError::InvalidMember {
        schema: schema.to_string(),
        member: member.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_parse_by_name_and_argument() {
        let file = SchemaFile::parse(
            r#"
            [schema.members.link]
            select = "a"
            then = ["stripped", { attr = "href" }, { prepend = "https://host" }]
            "#,
        )
        .unwrap();
        let member = &file.schema.members["link"];
        assert!(matches!(&member.then[0], TransformDef::Named(n) if n == "stripped"));
        assert!(matches!(&member.then[1], TransformDef::With(TransformArg::Attr(a)) if a == "href"));
        assert!(matches!(&member.then[2], TransformDef::With(TransformArg::Prepend(_))));
    }

    #[test]
    fn unknown_reference() {
        let file = SchemaFile::parse(
            r#"
            [schema.members.items]
            select = "li"
            then = [{ nested = "Item" }]
            "#,
        )
        .unwrap();
        let err = file.page_schema().unwrap_err();
        assert!(matches!(err, ToolError::Schema(SchemaError::UnknownSchema(name)) if name == "Item"));
    }

    #[test]
    fn reference_cycle() {
        let file = SchemaFile::parse(
            r#"
            [schema.members.a]
            path = "a"
            astype = { view = "A" }

            [schemas.A.members.b]
            path = "b"
            astype = { view = "B" }

            [schemas.B.members.a]
            path = "a"
            astype = { view = "A" }
            "#,
        )
        .unwrap();
        let err = file.view_schema().unwrap_err();
        assert!(matches!(err, ToolError::Schema(SchemaError::SchemaCycle(chain)) if chain == "A -> B -> A"));
    }

    #[test]
    fn json_keys_rejected_in_html_schema() {
        let file = SchemaFile::parse(
            r#"
            [schema.members.name]
            select = "h1"
            path = "name"
            "#,
        )
        .unwrap();
        assert!(matches!(
            file.page_schema().unwrap_err(),
            ToolError::InvalidMember { member, .. } if member == "name"
        ));
    }

    #[test]
    fn constant_mixed_with_other_keys() {
        for extra in [r#"select = "h1""#, r#"path = "version""#, "strict = true"] {
            let file = SchemaFile::parse(&format!(
                "[schema.members.version]\nconstant = 2\n{extra}\n"
            ))
            .unwrap();
            assert!(matches!(
                file.page_schema().unwrap_err(),
                ToolError::InvalidMember { ref member, .. } if member == "version"
            ));
            assert!(matches!(
                file.view_schema().unwrap_err(),
                ToolError::InvalidMember { ref member, .. } if member == "version"
            ));
        }
    }

    #[test]
    fn unknown_coercion() {
        let file = SchemaFile::parse(
            r#"
            [schema.members.n]
            path = "n"
            astype = "decimal"
            "#,
        )
        .unwrap();
        assert!(matches!(file.view_schema().unwrap_err(), ToolError::UnknownCoercion(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SchemaFile::parse(
            r#"
            [schema.members.n]
            selector = "h1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::SchemaFile(_)));
    }
}
