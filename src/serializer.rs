//! Variation URL serialization for API responses.
//!
//! [`to_representation`] turns an image field value into a JSON mapping
//! from variation name to accessible URL. It is a pure read: nothing is
//! rendered, and variations that have not been rendered yet (or whose
//! backend cannot produce URLs) are simply omitted.
//!
//! Key order is stable: `"original"` first, then the variations in their
//! declaration order (`serde_json`'s `preserve_order` feature keeps the
//! map insertion-ordered).

use crate::field::ImageFieldFile;
use serde_json::{Map, Value};

/// Serialize an image field value as a variation-name → URL mapping.
///
/// - An absent or empty value becomes JSON `null`.
/// - `"original"` is included only when the storage backend exposes a URL
///   for the base image.
/// - Each configured variation is included only when its derived file
///   exists and has a URL.
pub fn to_representation(value: Option<&ImageFieldFile>) -> Value {
    let Some(file) = value else {
        return Value::Null;
    };
    if file.name().is_empty() {
        return Value::Null;
    }

    let mut result = Map::new();
    if let Some(url) = file.url() {
        result.insert("original".to_string(), Value::String(url));
    }
    for variation in file.variations() {
        if !variation.exists() {
            continue;
        }
        if let Some(url) = variation.url() {
            result.insert(variation.variation_name().to_string(), Value::String(url));
        }
    }
    Value::Object(result)
}
