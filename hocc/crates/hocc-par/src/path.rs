//! Dotted path handling.
//!
//! Paths address values in the tree: `a.b.c`. Dots split unquoted text
//! into segments; a quoted chunk is a single segment no matter what it
//! contains, so `a."b.c"` has two segments. The same grammar serves
//! substitution bodies, key paths, and accessor lookups.

use thiserror::Error;

/// Path parsing failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty path segment")]
    EmptySegment,
    #[error("unterminated quoted path segment")]
    UnterminatedQuote,
}

/// Splits a raw path string into segments.
///
/// Surrounding whitespace is tolerated; interior quoted chunks keep
/// their dots. The empty string and empty segments (`a..b`, `a.`) are
/// errors.
///
/// # Example
///
/// ```
/// use hocc_par::path::split_path;
///
/// assert_eq!(split_path("a.b").unwrap(), vec!["a", "b"]);
/// assert_eq!(split_path("a.\"b.c\"").unwrap(), vec!["a", "b.c"]);
/// assert!(split_path("a..b").is_err());
/// ```
pub fn split_path(raw: &str) -> Result<Vec<String>, PathError> {
    let trimmed = raw.trim();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = trimmed.chars();
    loop {
        match chars.next() {
            None => break,
            Some('.') => {
                if current.is_empty() {
                    return Err(PathError::EmptySegment);
                }
                segments.push(std::mem::take(&mut current));
            }
            Some('"') => {
                // A quoted chunk is atomic; dots inside stay literal.
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    current.push(c);
                }
                if !closed {
                    return Err(PathError::UnterminatedQuote);
                }
                // A quoted chunk may legitimately be empty only if it is
                // the entire segment text so far; `""` as a key is still
                // an empty segment.
                if current.is_empty() {
                    return Err(PathError::EmptySegment);
                }
            }
            Some(c) => current.push(c),
        }
    }
    if current.is_empty() {
        return Err(PathError::EmptySegment);
    }
    segments.push(current);
    Ok(segments)
}

/// Joins segments back into a dotted string, e.g. for environment
/// variable lookup.
pub fn join_path(path: &[String]) -> String {
    path.join(".")
}

/// True if `prefix` is a (non-strict) prefix of `path`.
pub fn is_path_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path.iter()).all(|(a, b)| a == b)
}

/// The self-reference test: a reference is self-referential when its
/// target lies inside the substitution's own container, or names the
/// container or one of its ancestors. Either way, one path is a prefix
/// of the other.
pub fn is_self_reference(target: &[String], container: &[String]) -> bool {
    is_path_prefix(target, container) || is_path_prefix(container, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(segs: &[&str]) -> Vec<String> {
        segs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_simple() {
        assert_eq!(split_path("a").unwrap(), vec!["a"]);
        assert_eq!(split_path("a.b.c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_trims_surrounding_whitespace() {
        assert_eq!(split_path(" a.b ").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_split_quoted_segment_keeps_dots() {
        assert_eq!(split_path("a.\"b.c\".d").unwrap(), vec!["a", "b.c", "d"]);
    }

    #[test]
    fn test_split_errors() {
        assert_eq!(split_path(""), Err(PathError::EmptySegment));
        assert_eq!(split_path("a..b"), Err(PathError::EmptySegment));
        assert_eq!(split_path(".a"), Err(PathError::EmptySegment));
        assert_eq!(split_path("a."), Err(PathError::EmptySegment));
        assert_eq!(split_path("a.\"bc"), Err(PathError::UnterminatedQuote));
    }

    #[test]
    fn test_join() {
        assert_eq!(join_path(&p(&["a", "b"])), "a.b");
    }

    #[test]
    fn test_prefix() {
        assert!(is_path_prefix(&p(&["a"]), &p(&["a", "b"])));
        assert!(is_path_prefix(&p(&["a", "b"]), &p(&["a", "b"])));
        assert!(!is_path_prefix(&p(&["a", "b"]), &p(&["a"])));
        assert!(!is_path_prefix(&p(&["a", "x"]), &p(&["a", "b"])));
        assert!(is_path_prefix(&[], &p(&["a"])));
    }

    #[test]
    fn test_self_reference() {
        // foo = ${foo.a}: target inside container.
        assert!(is_self_reference(&p(&["foo", "a"]), &p(&["foo"])));
        // a.b = ${a}: target is an ancestor of the container.
        assert!(is_self_reference(&p(&["a"]), &p(&["a", "b"])));
        // Exact match.
        assert!(is_self_reference(&p(&["a"]), &p(&["a"])));
        // Siblings are not self-references.
        assert!(!is_self_reference(&p(&["bar", "foo"]), &p(&["bar", "baz"])));
    }
}
