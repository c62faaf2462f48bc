use std::fmt;
use std::sync::Arc;

use grabview_core::{SchemaError, Value, ViewError};
use scraper::Selector;
use tracing::trace;

use crate::document::Node;
use crate::transform::{Extracted, Transform, parse_href, parse_img};

#[derive(Clone)]
enum Target {
    /// The node the field is evaluated against.
    This,
    Css {
        source: String,
        compiled: Result<Selector, SchemaError>,
    },
}

/// A node-selecting field: a CSS selector, a transform chain, and single or
/// many mode.
///
/// In single mode the first match is transformed, and a missing match yields
/// [`Value::Absent`]. In many mode every truthy match is transformed, in
/// document order; falsy matches are dropped.
///
/// Selectors are compiled when the field is created; an invalid selector is
/// reported when the owning schema is built.
#[derive(Clone)]
pub struct Field {
    target: Target,
    then: Vec<Arc<dyn Transform>>,
    many: bool,
    memoized: bool,
}

impl Field {
    pub fn select(selector: impl Into<String>) -> Self {
        let source = selector.into();
        let compiled = Selector::parse(&source).map_err(|e| SchemaError::InvalidSelector {
            selector: source.clone(),
            reason: e.to_string(),
        });
        Self::with_target(Target::Css { source, compiled })
    }

    /// A field over the node itself rather than its descendants.
    pub fn this() -> Self {
        Self::with_target(Target::This)
    }

    /// Link field yielding `{href, label}`.
    pub fn href(selector: impl Into<String>) -> Self {
        Self::select(selector).then(parse_href())
    }

    /// Image field yielding `{src, label}`.
    pub fn image(selector: impl Into<String>) -> Self {
        Self::select(selector).then(parse_img())
    }

    fn with_target(target: Target) -> Self {
        Field {
            target,
            then: Vec::new(),
            many: false,
            memoized: false,
        }
    }

    /// Appends a transform to the chain.
    pub fn then(mut self, transform: impl Transform + 'static) -> Self {
        self.then.push(Arc::new(transform));
        self
    }

    /// Appends an already shared transform.
    pub fn then_shared(mut self, transform: Arc<dyn Transform>) -> Self {
        self.then.push(transform);
        self
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    /// Cache the value per page instance on first read.
    pub fn memoized(mut self) -> Self {
        self.memoized = true;
        self
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn is_memoized(&self) -> bool {
        self.memoized
    }

    /// Checks the selector and every transform's configuration.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Target::Css { compiled: Err(e), .. } = &self.target {
            return Err(e.clone());
        }
        self.then.iter().try_for_each(|t| t.validate())
    }

    /// Evaluates the field against `node`.
    pub fn evaluate(&self, node: Node<'_>) -> Result<Value, ViewError> {
        if self.many {
            let mut results = Vec::new();
            for matched in self.select_all(node)? {
                if !matched.is_truthy() {
                    trace!(node = ?matched, "dropping falsy match");
                    continue;
                }
                results.push(self.transform(matched)?);
            }
            Ok(Value::Seq(results))
        } else {
            match self.select_one(node)? {
                Some(matched) => self.transform(matched),
                None => Ok(Value::Absent),
            }
        }
    }

    fn select_one<'a>(&self, node: Node<'a>) -> Result<Option<Node<'a>>, SchemaError> {
        match &self.target {
            Target::This => Ok(Some(node)),
            Target::Css { compiled, .. } => Ok(node.select_one(compiled.as_ref().map_err(Clone::clone)?)),
        }
    }

    fn select_all<'a>(&self, node: Node<'a>) -> Result<Vec<Node<'a>>, SchemaError> {
        match &self.target {
            Target::This => Ok(vec![node]),
            Target::Css { compiled, .. } => Ok(node.select_all(compiled.as_ref().map_err(Clone::clone)?)),
        }
    }

    /// Folds the chain over one matched node, stopping at an absent result.
    fn transform(&self, node: Node<'_>) -> Result<Value, ViewError> {
        let mut current = Extracted::Node(node);
        for transform in &self.then {
            current = transform.apply(current)?;
            if current.is_absent() {
                return Ok(Value::Absent);
            }
        }
        Ok(current.into_value())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selector = match &self.target {
            Target::This => "<this>",
            Target::Css { source, .. } => source.as_str(),
        };
        f.debug_struct("Field")
            .field("selector", &selector)
            .field("then", &self.then)
            .field("many", &self.many)
            .finish()
    }
}
