//! Edge case tests for hocc-par

#[cfg(test)]
mod tests {
    use crate::reader::{MapReader, NullReader};
    use crate::{parse_str, ParseOutput, ScalarLit, SubKind, Value};
    use hocc_util::Handler;

    fn parse_ok(source: &str) -> ParseOutput {
        let handler = Handler::new();
        let output = parse_str(source, &handler, &NullReader).expect("no fatal error");
        assert!(
            !handler.has_errors(),
            "unexpected errors for {:?}: {:?}",
            source,
            handler.diagnostics()
        );
        output
    }

    fn parse_invalid(source: &str) -> ParseOutput {
        let handler = Handler::new();
        let output = parse_str(source, &handler, &NullReader).expect("no fatal error");
        assert!(handler.has_errors(), "expected errors for {:?}", source);
        output
    }

    fn lookup<'a>(output: &'a ParseOutput, path: &[&str]) -> Option<&'a Value> {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        output.root.lookup(&path)
    }

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_only_comments() {
        let output = parse_ok("// nothing here\n# nor here\n");
        match &output.root {
            Value::Object(o) => assert!(o.is_empty()),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }

    #[test]
    fn test_edge_scalar_types() {
        let output = parse_ok("i = 3\nd = 1.5\nt = true\nf = false\nn = null\nq = \"s\"");
        for (key, expected) in [
            ("i", ScalarLit::Int(3)),
            ("d", ScalarLit::Double(1.5)),
            ("t", ScalarLit::Bool(true)),
            ("f", ScalarLit::Bool(false)),
            ("n", ScalarLit::Null),
            ("q", ScalarLit::Quoted("s".into())),
        ] {
            match lookup(&output, &[key]) {
                Some(Value::Scalar(s)) => assert_eq!(s.lit, expected, "key {}", key),
                other => panic!("unexpected {:?} at {}", other, key),
            }
        }
    }

    #[test]
    fn test_edge_triple_quoted_value() {
        let output = parse_ok("text = \"\"\"line1\nline2\"\"\"");
        match lookup(&output, &["text"]) {
            Some(Value::Scalar(s)) => assert_eq!(s.lit, ScalarLit::Quoted("line1\nline2".into())),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_value_on_next_line() {
        // The lexer prunes one newline after a separator.
        let output = parse_ok("a =\n  1");
        match lookup(&output, &["a"]) {
            Some(Value::Scalar(s)) => assert_eq!(s.surface(), "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_key_after_newline_brace() {
        let output = parse_ok("foo\n{ a = 1 }");
        assert!(lookup(&output, &["foo", "a"]).is_some());
    }

    #[test]
    fn test_edge_deep_nesting() {
        let output = parse_ok("a { b { c { d { e = 1 } } } }");
        assert!(lookup(&output, &["a", "b", "c", "d", "e"]).is_some());
    }

    #[test]
    fn test_edge_deep_dotted_key() {
        let output = parse_ok("a.b.c.d.e = 1");
        assert!(lookup(&output, &["a", "b", "c", "d", "e"]).is_some());
        // Four intermediates plus the leaf.
        assert_eq!(output.stack.len(), 5);
    }

    #[test]
    fn test_edge_dotted_key_overwrites_scalar_intermediate() {
        let output = parse_ok("a = 1\na.b = 2");
        assert!(lookup(&output, &["a", "b"]).is_some());
    }

    #[test]
    fn test_edge_array_of_objects() {
        let output = parse_ok("servers = [{host = a}, {host = b}]");
        match lookup(&output, &["servers"]) {
            Some(Value::Array(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_nested_arrays() {
        let output = parse_ok("m = [[1, 2], [3]]");
        match lookup(&output, &["m"]) {
            Some(Value::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[0], Value::Array(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_array_elements_separated_by_newlines() {
        let output = parse_ok("a = [\n  1\n  2\n  3\n]");
        match lookup(&output, &["a"]) {
            Some(Value::Array(items)) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_single_element_concat_in_array() {
        // [1 2] is one element: the string "1 2".
        let output = parse_ok("a = [1 2]");
        match lookup(&output, &["a"]) {
            Some(Value::Array(items)) => {
                assert_eq!(items.len(), 1);
                match &items[0] {
                    Value::Scalar(s) => assert_eq!(s.surface(), "1 2"),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_number_key() {
        let output = parse_ok("404 = not-found");
        match &output.root {
            Value::Object(o) => assert!(o.contains_key("404")),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }

    #[test]
    fn test_edge_true_as_key() {
        let output = parse_ok("true = yes");
        match &output.root {
            Value::Object(o) => assert!(o.contains_key("true")),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }

    #[test]
    fn test_edge_path_like_unquoted_value() {
        let output = parse_ok("logdir = /var/log/app");
        match lookup(&output, &["logdir"]) {
            Some(Value::Scalar(s)) => assert_eq!(s.surface(), "/var/log/app"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_url_value_must_be_quoted() {
        // ':' terminates unquoted strings, so URLs are quoted.
        let output = parse_ok("endpoint = \"http://example.com/path\"");
        match lookup(&output, &["endpoint"]) {
            Some(Value::Scalar(s)) => {
                assert_eq!(s.surface(), "http://example.com/path")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_substitution_inside_array() {
        let output = parse_ok("a = [${x}, 2]");
        match lookup(&output, &["a"]) {
            Some(Value::Array(items)) => {
                assert!(matches!(items[0], Value::Substitution(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_substitution_concat_of_arrays() {
        let output = parse_ok("a = [1] ${x} [3]");
        match lookup(&output, &["a"]) {
            Some(Value::Substitution(sub)) => {
                assert_eq!(sub.kind, SubKind::Array);
                assert_eq!(sub.pieces.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_edge_comment_between_members() {
        let output = parse_ok("a = 1 // first\nb = 2 # second\nc = 3");
        match &output.root {
            Value::Object(o) => assert_eq!(o.len(), 3),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }

    #[test]
    fn test_edge_nested_include() {
        let reader = MapReader::new()
            .with("outer.conf", "include \"inner.conf\"\no = 1")
            .with("inner.conf", "i = 2");
        let handler = Handler::new();
        let output = parse_str(
            "top { include \"outer.conf\" }",
            &handler,
            &reader,
        )
        .expect("no fatal");
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
        assert!(lookup(&output, &["top", "i"]).is_some());
        assert!(lookup(&output, &["top", "o"]).is_some());
    }

    #[test]
    fn test_edge_include_duplicate_key_merges() {
        let reader = MapReader::new().with("base.conf", "a = {x = 1}");
        let handler = Handler::new();
        let output = parse_str(
            "a = {y = 2}\ninclude \"base.conf\"",
            &handler,
            &reader,
        )
        .expect("no fatal");
        assert!(!handler.has_errors());
        assert!(lookup(&output, &["a", "x"]).is_some());
        assert!(lookup(&output, &["a", "y"]).is_some());
    }

    #[test]
    fn test_edge_required_include_success() {
        let reader = MapReader::new().with("base.conf", "x = 1");
        let handler = Handler::new();
        let output = parse_str(
            "include required(file(\"base.conf\"))",
            &handler,
            &reader,
        )
        .expect("no fatal");
        assert!(!handler.has_errors());
        assert!(lookup(&output, &["x"]).is_some());
    }

    // ==================== ERROR CASES ====================

    #[test]
    fn test_err_value_missing() {
        let output = parse_invalid("a =");
        assert!(!output.valid);
    }

    #[test]
    fn test_err_key_only() {
        let output = parse_invalid("lonely");
        assert!(!output.valid);
    }

    #[test]
    fn test_err_stray_closer_at_root() {
        let output = parse_invalid("}\na = 1");
        assert!(!output.valid);
        assert!(lookup(&output, &["a"]).is_some());
    }

    #[test]
    fn test_err_unclosed_array() {
        let output = parse_invalid("a = [1, 2");
        assert!(!output.valid);
    }

    #[test]
    fn test_err_empty_substitution_path() {
        let output = parse_invalid("a = ${}");
        assert!(!output.valid);
    }

    #[test]
    fn test_err_object_scalar_concat() {
        let output = parse_invalid("a = {x = 1} 2");
        assert!(!output.valid);
    }

    #[test]
    fn test_err_malformed_include_recovers() {
        let output = parse_invalid("include file(42)\nb = 1");
        assert!(lookup(&output, &["b"]).is_some());
    }

    #[test]
    fn test_err_multiple_errors_accumulate() {
        let handler = Handler::new();
        let _ = parse_str("a = ?\nb = ?\nc = 1", &handler, &NullReader).expect("no fatal");
        assert!(handler.error_count() >= 2);
    }
}
