//! Edge case tests for hocc-lex

#[cfg(test)]
mod tests {
    use crate::{tokenize, TokenKind};
    use hocc_util::Handler;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let handler = Handler::new();
        tokenize(source, &handler)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_only_whitespace() {
        assert_eq!(kinds("   \t "), vec![TokenKind::Whitespace, TokenKind::Eof]);
    }

    #[test]
    fn test_edge_only_newlines() {
        assert_eq!(
            kinds("\n\n"),
            vec![TokenKind::Newline, TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn test_edge_separator_control_chars() {
        // ASCII 0x1C-0x1F count as whitespace.
        assert_eq!(
            kinds("\u{1C}\u{1D}\u{1E}\u{1F}"),
            vec![TokenKind::Whitespace, TokenKind::Eof]
        );
    }

    #[test]
    fn test_edge_empty_quoted_string() {
        assert_eq!(kinds("\"\"")[0], TokenKind::Quoted(String::new()));
    }

    #[test]
    fn test_edge_empty_triple_quoted() {
        // Six quotes: empty triple-quoted string.
        assert_eq!(kinds("\"\"\"\"\"\"")[0], TokenKind::TripleQuoted(String::new()));
    }

    #[test]
    fn test_edge_quoted_string_with_forbidden_chars() {
        assert_eq!(
            kinds("\"a{b}[c]:=,+#\"")[0],
            TokenKind::Quoted("a{b}[c]:=,+#".to_string())
        );
    }

    #[test]
    fn test_edge_substitution_with_spaces_in_body() {
        // The body is raw; the parser deals with it.
        assert_eq!(kinds("${ a.b }")[0], TokenKind::Sub(" a.b ".to_string()));
    }

    #[test]
    fn test_edge_empty_substitution_body() {
        assert_eq!(kinds("${}")[0], TokenKind::Sub(String::new()));
    }

    #[test]
    fn test_edge_zero() {
        assert_eq!(kinds("0")[0], TokenKind::Int(0));
        assert_eq!(kinds("-0")[0], TokenKind::Int(0));
    }

    #[test]
    fn test_edge_leading_zeros() {
        assert_eq!(kinds("007")[0], TokenKind::Int(7));
    }

    #[test]
    fn test_edge_minus_alone_is_unquoted() {
        assert_eq!(kinds("-")[0], TokenKind::Unquoted);
        assert_eq!(kinds("-abc")[0], TokenKind::Unquoted);
    }

    #[test]
    fn test_edge_dotted_number_concat() {
        // 1.2.3 lexes as a double then an unquoted remainder; the parser's
        // value concatenation reassembles the surface text.
        let k = kinds("1.2.3");
        assert_eq!(k[0], TokenKind::Double(1.2));
        assert_eq!(k[1], TokenKind::Unquoted);
    }

    #[test]
    fn test_edge_unicode_in_unquoted() {
        let handler = Handler::new();
        let tokens = crate::tokenize("héllo", &handler);
        assert_eq!(tokens[0].lexeme, "héllo");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_edge_crlf_lines() {
        // \r is inline whitespace, \n is the separator.
        assert_eq!(
            kinds("a\r\nb"),
            vec![
                TokenKind::Unquoted,
                TokenKind::Whitespace,
                TokenKind::Newline,
                TokenKind::Unquoted,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_edge_comment_at_eof_without_newline() {
        assert_eq!(kinds("a # done"), vec![
            TokenKind::Unquoted,
            TokenKind::Whitespace,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_edge_hash_terminates_unquoted() {
        let k = kinds("ab#cd");
        // '#' starts a comment even glued to the word.
        assert_eq!(k, vec![TokenKind::Unquoted, TokenKind::Eof]);
    }

    #[test]
    fn test_edge_question_token() {
        assert_eq!(kinds("?")[0], TokenKind::Question);
    }

    // ==================== ERROR CASES ====================

    #[test]
    fn test_err_unterminated_substitution() {
        let handler = Handler::new();
        let _ = crate::tokenize("${a.b", &handler);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_unterminated_triple_quoted() {
        let handler = Handler::new();
        let _ = crate::tokenize("\"\"\"abc", &handler);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_lone_plus() {
        let handler = Handler::new();
        let tokens = crate::tokenize("a + b", &handler);
        assert!(handler.has_errors());
        // Resyncs and keeps lexing.
        assert!(tokens.iter().any(|t| t.lexeme == "b"));
    }

    #[test]
    fn test_err_unpaired_surrogate() {
        let handler = Handler::new();
        let _ = crate::tokenize("\"\\uD800x\"", &handler);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_err_short_unicode_escape() {
        let handler = Handler::new();
        let _ = crate::tokenize("\"\\u12\"", &handler);
        assert!(handler.has_errors());
    }

    // ==================== PROPERTIES ====================

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The lexer must terminate and Eof-terminate on any input.
            #[test]
            fn prop_always_ends_with_eof(source in ".*") {
                let handler = Handler::new();
                let tokens = crate::tokenize(&source, &handler);
                prop_assert!(matches!(tokens.last().unwrap().kind, TokenKind::Eof));
            }

            // Clean ASCII identifiers lex as a single unquoted token.
            #[test]
            fn prop_identifier_roundtrip(word in "[a-z][a-z0-9_.-]{0,20}") {
                let handler = Handler::new();
                let tokens = crate::tokenize(&word, &handler);
                prop_assert!(!handler.has_errors());
                prop_assert_eq!(tokens[0].lexeme.clone(), word);
            }
        }
    }
}
