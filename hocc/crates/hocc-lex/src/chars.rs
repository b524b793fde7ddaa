//! Character classes of the configuration grammar.
//!
//! The format defines its own whitespace set (ASCII separators 0x1C-0x1F
//! count, newline is grammatically distinct) and a forbidden set that
//! terminates unquoted strings. Everything else may appear in an unquoted
//! string, including `.` (split later into path segments) and `/` (so
//! filesystem paths survive unquoted).

/// Returns true for horizontal whitespace: space, tab, carriage return,
/// form feed, vertical tab, and the ASCII separators 0x1C-0x1F.
///
/// Newline is excluded; it terminates members and gets its own token.
#[inline]
pub fn is_inline_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0B' | '\x0C' | '\x1C'..='\x1F')
}

/// Returns true for any whitespace the grammar recognizes, newline
/// included.
#[inline]
pub fn is_whitespace(c: char) -> bool {
    c == '\n' || is_inline_whitespace(c)
}

/// Returns true for characters that terminate an unquoted string.
///
/// Parentheses are included so `file("x")` lexes as four tokens rather
/// than swallowing the opening paren into the word before it.
#[inline]
pub fn is_forbidden(c: char) -> bool {
    is_whitespace(c)
        || matches!(
            c,
            '$' | '"'
                | '{'
                | '}'
                | '['
                | ']'
                | ':'
                | '='
                | ','
                | '+'
                | '#'
                | '`'
                | '^'
                | '?'
                | '!'
                | '@'
                | '*'
                | '&'
                | '\\'
                | '('
                | ')'
        )
}

/// Returns true for ASCII decimal digits.
#[inline]
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Returns true for ASCII hex digits.
#[inline]
pub fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_whitespace() {
        assert!(is_inline_whitespace(' '));
        assert!(is_inline_whitespace('\t'));
        assert!(is_inline_whitespace('\r'));
        assert!(is_inline_whitespace('\x1C'));
        assert!(is_inline_whitespace('\x1F'));
        assert!(!is_inline_whitespace('\n'));
        assert!(!is_inline_whitespace('a'));
    }

    #[test]
    fn test_whitespace_includes_newline() {
        assert!(is_whitespace('\n'));
        assert!(is_whitespace(' '));
        assert!(!is_whitespace('x'));
    }

    #[test]
    fn test_forbidden() {
        for c in ['$', '"', '{', '}', '[', ']', ':', '=', ',', '+', '#', '`', '^', '?', '!',
                  '@', '*', '&', '\\', '(', ')', ' ', '\n'] {
            assert!(is_forbidden(c), "{:?} should be forbidden", c);
        }
        // Legal unquoted content, including path dots and URL slashes.
        for c in ['a', 'Z', '0', '.', '/', '-', '_', '~', '\'', '%'] {
            assert!(!is_forbidden(c), "{:?} should be allowed", c);
        }
    }
}
