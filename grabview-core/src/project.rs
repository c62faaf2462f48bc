//! Projection chains: declarative extraction of one value from nested data.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::coerce::{Coerce, to_map};
use crate::error::{BoxError, ViewError};
use crate::navigate::lookup;
use crate::step::{Step, display_path};
use crate::value::{Record, Value};

type CallFn = dyn Fn(&Value) -> Result<Value, BoxError> + Send + Sync;

#[derive(Clone)]
enum Source {
    /// Steps applied left to right.
    Path(Vec<Step>),
    /// Child projections evaluated against the same root and zipped.
    Zip(Vec<Project>),
    /// A function applied to the root, bypassing navigation.
    Call(Arc<CallFn>),
}

/// A projection from a root value to one extracted value.
///
/// Projections are tolerant by default: the first structural miss
/// short-circuits to the configured default (null unless set). A strict
/// projection reports the miss as [`ViewError::MissingField`] instead.
///
/// ```
/// use grabview_core::{Project, Value};
///
/// let data = Value::map([("a", Value::map([("b", 1)]))]);
/// assert_eq!(Project::path(["a", "b"]).evaluate(&data).unwrap(), Value::Int(1));
/// assert_eq!(Project::path(["a", "fake"]).evaluate(&data).unwrap(), Value::Null);
/// assert!(Project::path(["a", "fake"]).strict().evaluate(&data).is_err());
/// ```
#[derive(Clone)]
pub struct Project {
    source: Source,
    coerce: Option<Coerce>,
    strict: bool,
    default: Value,
}

impl Project {
    fn with_source(source: Source) -> Self {
        Project {
            source,
            coerce: None,
            strict: false,
            default: Value::Null,
        }
    }

    /// Projection along explicit steps.
    pub fn path<S: Into<Step>>(steps: impl IntoIterator<Item = S>) -> Self {
        Self::with_source(Source::Path(steps.into_iter().map(Into::into).collect()))
    }

    /// Projection along a dotted path such as `"current.field.2"`.
    pub fn dotted(path: &str) -> Self {
        Self::with_source(Source::Path(Step::parse_path(path)))
    }

    /// Zips the results of several projections into a sequence of tuples.
    ///
    /// Each child is evaluated independently against the same root; the zip
    /// stops at the shortest child. With a coercion, the tuple sequence is fed
    /// through it (see [`Project::zip_map`]).
    pub fn zip(children: impl IntoIterator<Item = Project>) -> Self {
        Self::with_source(Source::Zip(children.into_iter().collect()))
    }

    /// Zip of two projections turned into a mapping from the first's values
    /// to the second's.
    pub fn zip_map(keys: Project, values: Project) -> Self {
        Self::zip([keys, values]).astype(to_map())
    }

    /// Applies `f` to the root instead of navigating.
    pub fn call<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::with_source(Source::Call(Arc::new(f)))
    }

    /// Coercion applied to the navigated value.
    pub fn astype(mut self, coerce: Coerce) -> Self {
        self.coerce = Some(coerce);
        self
    }

    /// Report structural misses instead of resolving them to the default.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Value returned when a tolerant projection misses.
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Evaluates the projection against `root`. The root is never modified.
    pub fn evaluate(&self, root: &Value) -> Result<Value, ViewError> {
        let value = match &self.source {
            Source::Path(steps) => match self.walk(root, steps)? {
                Some(value) => value,
                None => return Ok(self.default.clone()),
            },
            Source::Zip(children) => {
                let columns = children
                    .iter()
                    .map(|child| child.evaluate(root))
                    .collect::<Result<Vec<_>, _>>()?;
                zip_columns(&columns)
            }
            Source::Call(f) => f(root).map_err(ViewError::Coercion)?,
        };

        match &self.coerce {
            Some(coerce) => coerce.apply(value).map_err(ViewError::Coercion),
            None => Ok(value),
        }
    }

    /// Walks the steps; `None` means a tolerant miss.
    fn walk(&self, root: &Value, steps: &[Step]) -> Result<Option<Value>, ViewError> {
        let mut current = root.clone();
        for (depth, step) in steps.iter().enumerate() {
            match lookup(&current, step) {
                Some(next) => current = next,
                None if self.strict => {
                    trace!(step = %step, "strict projection missed");
                    return Err(ViewError::MissingField {
                        key: step.to_string(),
                        path: display_path(&steps[..=depth]),
                    });
                }
                None => {
                    trace!(step = %step, "projection short-circuited to default");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Project");
        match &self.source {
            Source::Path(steps) => s.field("path", &display_path(steps)),
            Source::Zip(children) => s.field("zip", children),
            Source::Call(_) => s.field("call", &".."),
        };
        s.field("strict", &self.strict)
            .field("default", &self.default)
            .field("coerce", &self.coerce.is_some())
            .finish()
    }
}

/// Positional zip; non-sequence columns count as empty.
fn zip_columns(columns: &[Value]) -> Value {
    let items: Vec<&[Value]> = columns
        .iter()
        .map(|column| column.as_items().unwrap_or(&[]))
        .collect();
    let len = items.iter().map(|column| column.len()).min().unwrap_or(0);
    Value::Seq(
        (0..len)
            .map(|row| Value::Seq(items.iter().map(|column| column[row].clone()).collect()))
            .collect(),
    )
}

/// Evaluates several named projections against the same root.
pub fn project<'a, I>(root: &Value, projections: I) -> Result<Record, ViewError>
where
    I: IntoIterator<Item = (&'a str, &'a Project)>,
{
    projections
        .into_iter()
        .map(|(name, projection)| projection.evaluate(root).map(|value| (name.to_string(), value)))
        .collect()
}
