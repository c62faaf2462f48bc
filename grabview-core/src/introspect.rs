//! Classification of declared schema members into exported fields.
//!
//! Runs once, when a schema is built. The resulting [`FieldSet`] is immutable
//! and shared by every instance of the schema.

use indexmap::{IndexMap, IndexSet};

use crate::error::SchemaError;

/// Name prefix marking a callable member as a dynamic field.
pub const DYNAMIC_PREFIX: &str = "attr_";

/// Shape of a declared member, as far as classification is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A field descriptor (projection or node selector).
    Descriptor,
    /// A function of the raw source.
    Callable,
    /// A plain attribute: constant or computed property.
    Attribute,
    /// A nested type declaration, such as an inner schema.
    NestedType,
}

/// Explicit allow-list or deny-list of exported names. At most one may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldConfig {
    pub fields: Vec<String>,
    pub ignore_fields: Vec<String>,
}

impl FieldConfig {
    pub fn fields<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        FieldConfig {
            fields: names.into_iter().map(Into::into).collect(),
            ignore_fields: Vec::new(),
        }
    }

    pub fn ignore_fields<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        FieldConfig {
            fields: Vec::new(),
            ignore_fields: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// The frozen outcome of classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    /// Exported name to declared member name, in declaration order.
    exported: IndexMap<String, String>,
    /// Exported names backed by a dynamic callable.
    dynamic: IndexSet<String>,
}

impl FieldSet {
    /// Exported field names, in declaration order.
    pub fn exported(&self) -> impl Iterator<Item = &str> {
        self.exported.keys().map(String::as_str)
    }

    /// Exported names paired with the member each one reads.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.exported.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn dynamic(&self) -> impl Iterator<Item = &str> {
        self.dynamic.iter().map(String::as_str)
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exported.contains_key(name)
    }

    pub fn is_dynamic(&self, name: &str) -> bool {
        self.dynamic.contains(name)
    }

    pub fn len(&self) -> usize {
        self.exported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exported.is_empty()
    }
}

/// Classifies declared members into the exported field set.
///
/// - `_`-prefixed members are internal, whatever their kind.
/// - Descriptors are exported under their own name.
/// - Callables named `attr_<name>` are dynamic fields exported as `<name>`;
///   other callables are plumbing.
/// - Plain attributes are exported unless their name starts with an uppercase
///   letter, which marks a nested type declaration.
/// - Nested type declarations are never exported.
///
/// The allow-list is then intersected with, or the deny-list subtracted from,
/// the exported names. Configuring both lists fails.
pub fn classify<'a, I>(schema: &str, members: I, config: &FieldConfig) -> Result<FieldSet, SchemaError>
where
    I: IntoIterator<Item = (&'a str, MemberKind)>,
{
    if !config.fields.is_empty() && !config.ignore_fields.is_empty() {
        return Err(SchemaError::ConflictingFieldConfig {
            schema: schema.to_string(),
        });
    }

    let mut set = FieldSet::default();
    for (name, kind) in members {
        if name.starts_with('_') {
            continue;
        }
        let (exported, dynamic) = match kind {
            MemberKind::Descriptor => (name, false),
            MemberKind::Callable => match name.strip_prefix(DYNAMIC_PREFIX) {
                Some(stripped) if !stripped.is_empty() => (stripped, true),
                _ => continue,
            },
            MemberKind::Attribute => {
                if name.starts_with(|c: char| c.is_uppercase()) {
                    continue;
                }
                (name, false)
            }
            MemberKind::NestedType => continue,
        };
        // `attr_x` and `x` would both export as `x`
        if set.exported.contains_key(exported) {
            return Err(SchemaError::DuplicateMember {
                schema: schema.to_string(),
                member: exported.to_string(),
            });
        }
        if dynamic {
            set.dynamic.insert(exported.to_string());
        }
        set.exported.insert(exported.to_string(), name.to_string());
    }

    if !config.fields.is_empty() {
        set.exported.retain(|name, _| config.fields.iter().any(|f| f == name));
    }
    if !config.ignore_fields.is_empty() {
        set.exported
            .retain(|name, _| !config.ignore_fields.iter().any(|f| f == name));
    }
    let exported = &set.exported;
    set.dynamic.retain(|name| exported.contains_key(name));

    Ok(set)
}
