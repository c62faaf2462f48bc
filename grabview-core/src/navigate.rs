//! Error-tolerant single-step navigation over [`Value`] containers.

use crate::step::Step;
use crate::value::Value;

/// Applies one step to a container.
///
/// Never fails: a missing key, an out-of-range index, a set miss or an unknown
/// attribute all resolve to [`Value::Absent`], as does any step taken from an
/// absent, null or empty value.
pub fn navigate(container: &Value, step: &Step) -> Value {
    lookup(container, step).unwrap_or(Value::Absent)
}

/// Like [`navigate`], but reports a miss as `None` so callers can tell a
/// structural miss from a present value.
pub fn lookup(container: &Value, step: &Step) -> Option<Value> {
    if container.is_empty() {
        return None;
    }

    if let Step::Pattern(regex) = step {
        return Some(scan(container, regex));
    }

    match container {
        Value::Map(map) => map.get(step.name().as_str()).cloned(),
        Value::Seq(items) => match step {
            Step::Index(index) => usize::try_from(*index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned(),
            _ => None,
        },
        Value::Set(items) => {
            let needle = step.as_value();
            items.contains(&needle).then_some(needle)
        }
        Value::Object(obj) => obj.attr(&step.name()),
        _ => None,
    }
}

/// Bulk pattern scan: values under matching keys for a mapping, elements whose
/// text form matches for a sequence or set, nothing for other shapes.
fn scan(container: &Value, regex: &regex::Regex) -> Value {
    let matched = match container {
        Value::Map(map) => map
            .iter()
            .filter(|(key, _)| regex.is_match(key))
            .map(|(_, value)| value.clone())
            .collect(),
        Value::Seq(items) | Value::Set(items) => items
            .iter()
            .filter(|item| item.to_text().is_some_and(|text| regex.is_match(&text)))
            .cloned()
            .collect(),
        _ => Vec::new(),
    };
    Value::Seq(matched)
}
