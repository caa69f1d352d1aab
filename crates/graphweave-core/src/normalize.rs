//! Identifier normalization.
//!
//! Entity identity is a pure function of the label: every assertion about
//! "Customer C001" must land on the same node no matter how the model spells
//! the casing or punctuation. Changing these rules re-keys every stored entity,
//! so any change must bump [`NORMALIZER_VERSION`].

/// Version of the normalization rules. Stored alongside the base schema.
pub const NORMALIZER_VERSION: u32 = 1;

/// Key used for empty or missing labels.
pub const UNKNOWN_KEY: &str = "unknown";

/// Table name used when a relationship type normalizes to nothing.
pub const UNKNOWN_RELATIONSHIP: &str = "UNKNOWN";

/// Map a free-text label to a stable storage key.
///
/// Keeps only `[A-Za-z0-9_]`, lowercases the result and falls back to
/// [`UNKNOWN_KEY`] when nothing survives.
///
/// ```
/// use graphweave_core::normalize_label;
///
/// assert_eq!(normalize_label("Customer C001"), "customerc001");
/// assert_eq!(normalize_label("  !!  "), "unknown");
/// ```
pub fn normalize_label(label: &str) -> String {
    let key: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if key.is_empty() {
        UNKNOWN_KEY.to_string()
    } else {
        key
    }
}

/// Map a free-form relationship type to the table that stores its edges.
///
/// Whitespace, `-` and `.` become `_`, every other character outside
/// `[A-Za-z0-9_]` is dropped, runs of `_` collapse and the result is
/// uppercased. Table names cannot start with a digit, so those get a `REL_`
/// prefix.
///
/// ```
/// use graphweave_core::normalize_relationship_type;
///
/// assert_eq!(normalize_relationship_type("works at"), "WORKS_AT");
/// assert_eq!(normalize_relationship_type("purchased-by"), "PURCHASED_BY");
/// ```
pub fn normalize_relationship_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() {
            Some(c.to_ascii_uppercase())
        } else if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            Some('_')
        } else {
            None
        };

        if let Some(m) = mapped {
            if m == '_' && out.ends_with('_') {
                continue;
            }
            out.push(m);
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return UNKNOWN_RELATIONSHIP.to_string();
    }

    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("REL_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}
