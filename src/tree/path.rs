//! Path relations between listing entries.
//!
//! Listing paths may use either `/` or `\` as separator. Both sides are
//! normalised to `/` before any comparison.

use std::borrow::Cow;

pub const SEPARATOR: char = '/';

/// Normalise a path to `/` separators.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Last path segment, ignoring trailing separators.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
}

fn descendant_suffix<'a>(parent: &str, child: &'a str) -> Option<&'a str> {
    let parent = parent.trim_end_matches(SEPARATOR);
    child
        .strip_prefix(parent)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
}

/// `child` lies somewhere below `parent`.
pub fn is_descendant(parent: &str, child: &str) -> bool {
    let parent = normalize(parent);
    let child = normalize(child);
    descendant_suffix(&parent, &child).is_some()
}

/// `child` lies exactly one level below `parent`.
pub fn is_direct_child(parent: &str, child: &str) -> bool {
    let parent = normalize(parent);
    let child = normalize(child);
    match descendant_suffix(&parent, &child) {
        Some(rest) => !rest.is_empty() && !rest.contains(SEPARATOR),
        None => false,
    }
}

/// Both paths name the same entry once separators are normalised.
pub fn same_path(a: &str, b: &str) -> bool {
    normalize(a).trim_end_matches(SEPARATOR) == normalize(b).trim_end_matches(SEPARATOR)
}
