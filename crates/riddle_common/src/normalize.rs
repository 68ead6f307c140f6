//! Text canonicalization applied before every pattern test and cache lookup.

/// Lower-case, trim, and collapse internal whitespace runs to one space.
///
/// Every stage of the cascade and the verdict cache key go through this, so
/// two questions differing only in case or spacing are the same question.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().flat_map(char::to_lowercase));
    }
    out
}

/// Number of characters (not bytes) in already-normalized text.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
