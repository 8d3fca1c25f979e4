//! Document-level merging: how a decoded payload lands on an existing value.
//!
//! Every structured write (a JSON env value, a config file, a data buffer) goes
//! through the same path: serialize the current value into a document, deep-merge
//! the payload over it, and deserialize the result back. Objects merge key by
//! key, so a payload only overwrites what it names; everything else replaces.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::field::Field;
use crate::types::Kind;

/// Deep-merge `overlay` on top of `base`.
/// If both sides are objects, recurse key by key.
/// Otherwise, `overlay` wins.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => Value::Object(merge_maps(base, overlay)),
        (_, overlay) => overlay,
    }
}

fn merge_maps(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, overlay_val) in overlay {
        let merged = match base.remove(&key) {
            Some(base_val) => deep_merge(base_val, overlay_val),
            None => overlay_val,
        };
        base.insert(key, merged);
    }
    base
}

/// `prefix.name`, or `name` at the top level.
fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Remove the key for a hidden field, reporting it as unknown.
pub fn drop_hidden(
    object: &mut Map<String, Value>,
    name: &str,
    prefix: &str,
    unknown: &mut Vec<String>,
) {
    if object.remove(name).is_some() {
        unknown.push(join_path(prefix, name));
    }
}

/// Fit the entry for `field` in `object`. Only `Option` and
/// `serde_json::Value` fields take `null`; for the rest the key is dropped so
/// the current value survives.
pub fn prepare_field(
    object: &mut Map<String, Value>,
    name: &str,
    field: &dyn Field,
    prefix: &str,
    unknown: &mut Vec<String>,
) {
    let Some(child) = object.get_mut(name) else {
        return;
    };
    if child.is_null() {
        if !matches!(field.kind(), Kind::Optional | Kind::Any) {
            object.remove(name);
        }
        return;
    }
    field.prepare_document(child, &join_path(prefix, name), unknown);
}

/// Merge `overlay` into `target` in place.
///
/// Keys the target type doesn't consume are pushed onto `unknown` as dotted
/// paths. On error `target` is left untouched. A `null` overlay only lands when
/// `T` can be built from it; otherwise `target` keeps its value.
pub fn merge_into<T>(
    target: &mut T,
    overlay: Value,
    unknown: &mut Vec<String>,
) -> Result<(), serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    if overlay.is_null() {
        if let Ok(value) = serde_json::from_value(Value::Null) {
            *target = value;
        }
        return Ok(());
    }
    let base = serde_json::to_value(&*target)?;
    let merged = deep_merge(base, overlay);
    let value: T = serde_ignored::deserialize(merged, |path| unknown.push(path.to_string()))?;
    *target = value;
    Ok(())
}
