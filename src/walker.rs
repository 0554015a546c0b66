//! JSON tree walking
//!
//! Catalogs are arbitrary JSON: nested objects, arrays, and non-string
//! scalars that must survive untouched. Only string leaves are translatable,
//! and of those, empty strings and pure placeholders (`"{count}"`) are left
//! alone.

use crate::mt::protect::is_pure_placeholder;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Whether a string leaf should be sent for translation
pub fn is_translatable(text: &str) -> bool {
    !text.is_empty() && !is_pure_placeholder(text)
}

/// Every distinct translatable string in `value`
///
/// Identical strings at different paths collapse to one entry.
pub fn collect(value: &Value) -> BTreeSet<String> {
    let mut texts = BTreeSet::new();
    collect_into(value, &mut texts);
    texts
}

fn collect_into(value: &Value, texts: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_into(v, texts)),
        Value::Array(items) => items.iter().for_each(|v| collect_into(v, texts)),
        Value::String(s) if is_translatable(s) => {
            texts.insert(s.clone());
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// Copy of `value` with translated strings swapped in
///
/// Strings without an entry in `translations` are kept as they are.
pub fn rewrite(value: &Value, translations: &HashMap<String, String>) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), rewrite(v, translations)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| rewrite(v, translations)).collect())
        }
        Value::String(s) if is_translatable(s) => match translations.get(s) {
            Some(translated) => Value::String(translated.clone()),
            None => value.clone(),
        },
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => value.clone(),
    }
}
