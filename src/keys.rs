//! Key helpers
//!
//! The ordered index and the payload store share one namespace of
//! fully-qualified keys: `prefix:id`.

/// Separator between key segments
pub const SEPARATOR: &str = ":";

/// Join segments into a fully-qualified key
pub fn generate_key(segments: &[&str]) -> String {
    segments.join(SEPARATOR)
}

/// Fully-qualified data key for an id within a prefix
pub fn data_key(prefix: &str, id: &str) -> String {
    generate_key(&[prefix, id])
}

/// The trailing segment of a key
pub fn id_from_key(key: &str) -> &str {
    key.rsplit(SEPARATOR).next().unwrap_or(key)
}

/// The id part of `key` when it was generated under `prefix`
pub fn id_within<'k>(key: &'k str, prefix: &str) -> Option<&'k str> {
    key.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
}

/// Whether `key` was generated under `prefix`
pub fn belongs_to(key: &str, prefix: &str) -> bool {
    id_within(key, prefix).is_some()
}
