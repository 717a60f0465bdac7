//! Image URL extraction from page JSON.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Path prefixes under which the backend serves static assets.
pub const STATIC_ASSET_PREFIXES: &[&str] = &["/static/", "/media/", "/uploads/", "/images/", "/assets/"];

fn image_extension() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\.(jpe?g|png|gif|webp|avif|svg|bmp)\b")
            .expect("image extension pattern is valid")
    })
}

/// Whether a JSON string value looks like an image URL.
///
/// It must be absolute HTTP(S) or start with a static-asset prefix, and
/// contain a known image extension anywhere, including inside a query
/// string as resizer URLs do.
pub fn is_image_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    let lower = candidate.to_ascii_lowercase();
    let rooted = lower.starts_with("http://")
        || lower.starts_with("https://")
        || STATIC_ASSET_PREFIXES.iter().any(|p| lower.starts_with(p));

    rooted && image_extension().is_match(candidate)
}

/// Collect every image URL in `content`, in document order, without duplicates.
///
/// Walks nested objects and arrays; object members are visited in the order
/// the JSON document lists them.
pub fn collect_image_urls(content: &Value) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    walk(content, &mut seen, &mut urls);
    urls
}

/// Collect image URLs across several documents, deduplicated across all of them.
pub fn collect_image_urls_from<'a>(documents: impl IntoIterator<Item = &'a Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for document in documents {
        walk(document, &mut seen, &mut urls);
    }
    urls
}

fn walk(value: &Value, seen: &mut HashSet<String>, urls: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if is_image_url(s) {
                let url = s.trim().to_string();
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| walk(item, seen, urls)),
        Value::Object(members) => members.values().for_each(|member| walk(member, seen, urls)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
