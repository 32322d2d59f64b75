//! Edge case tests for ifjc-gen.

#[cfg(test)]
mod tests {
    use crate::emitter::CodeGen;
    use ifjc_lex::Lexer;
    use ifjc_par::Parser;
    use ifjc_sem::SemanticAnalyzer;

    fn compile(source: &str) -> String {
        let mut program = Parser::new(Lexer::new(source.as_bytes()))
            .parse()
            .expect("parse failed");
        let analysis = SemanticAnalyzer::new()
            .analyze(&mut program)
            .expect("analysis failed");
        CodeGen::generate(&program, &analysis).expect("emission failed")
    }

    fn wrap(body: &str) -> String {
        format!(
            "import \"ifj25\" for Ifj\nclass Program {{\nstatic main() {{\n{body}\n}}\n}}\n"
        )
    }

    /// No label may be defined twice, and every target must resolve.
    fn assert_labels_consistent(code: &str) {
        let mut defined = std::collections::BTreeMap::new();
        for line in code.lines() {
            if let Some(label) = line.strip_prefix("LABEL ") {
                *defined.entry(label).or_insert(0u32) += 1;
            }
        }
        for (label, count) in &defined {
            assert_eq!(*count, 1, "label {label} defined {count} times");
        }
        for line in code.lines() {
            let mut words = line.split_whitespace();
            if let Some("JUMP" | "JUMPIFEQ" | "JUMPIFNEQ" | "JUMPIFEQS" | "JUMPIFNEQS" | "CALL") =
                words.next()
            {
                let target = words.next().expect("jump without target");
                assert!(defined.contains_key(target), "undefined target {target}");
            }
        }
    }

    #[test]
    fn test_edge_label_families_pair_up() {
        let code = compile(&wrap(
            "var n\nn = 3\nwhile (n > 0) {\nwhile (n > 1) {\nn = n - 1\n}\nn = n - 1\n}",
        ));
        assert_labels_consistent(&code);
        let whiles = code.lines().filter(|l| l.starts_with("LABEL $while")).count();
        let ends = code
            .lines()
            .filter(|l| l.starts_with("LABEL $endwhile"))
            .count();
        assert_eq!(whiles, 2);
        assert_eq!(ends, 2);
    }

    #[test]
    fn test_edge_nested_ifs_get_distinct_ids() {
        let code = compile(&wrap(
            "var x\nx = 1\nif (x > 0) {\nif (x > 1) {\nx = 2\n} else {\nx = 3\n}\n} else {\nx = 4\n}",
        ));
        assert_labels_consistent(&code);
        let endifs: Vec<&str> = code
            .lines()
            .filter(|l| l.starts_with("LABEL $endif"))
            .collect();
        assert_eq!(endifs.len(), 2);
        assert_ne!(endifs[0], endifs[1]);
    }

    #[test]
    fn test_edge_globals_emitted_in_sorted_order() {
        let code = compile(&wrap("__zeta = 1\n__alpha = 2"));
        let alpha = code.find("DEFVAR GF@__alpha").unwrap();
        let zeta = code.find("DEFVAR GF@__zeta").unwrap();
        assert!(alpha < zeta);
    }

    #[test]
    fn test_edge_string_repetition_loop() {
        let code = compile(&wrap("var s\ns = \"ab\" * 3"));
        assert_labels_consistent(&code);
        assert!(code.contains("ISINT LF@result LF@op2"));
        assert!(code.contains("CONCAT LF@result LF@result LF@op1"));
        assert!(code.contains("ADD LF@iter LF@iter int@1"));
    }

    #[test]
    fn test_edge_is_null_pushes_nil_tag() {
        let code = compile(&wrap("var x\nx = 1\nvar y\ny = x is Null"));
        assert!(code.contains("PUSHS string@nil"));
    }

    #[test]
    fn test_edge_getter_locals_are_hoisted() {
        let code = compile(
            "import \"ifj25\" for Ifj\nclass Program {\n\
             static g {\nvar t\nt = 1\nreturn t\n}\n\
             static main() {\nvar v\nv = g\n}\n}\n",
        );
        let getter_at = code.find("LABEL $getter_g").unwrap();
        let defvar_at = code[getter_at..].find("DEFVAR LF@t$2").unwrap();
        let body_at = code[getter_at..].find("POPS LF@t$2").unwrap();
        assert!(defvar_at < body_at);
    }

    #[test]
    fn test_edge_arithmetic_guards_exit_26() {
        for body in [
            "var x\nx = 1 + 1",
            "var x\nx = 1 - 1",
            "var x\nx = 2 * 2",
            "var x\nx = 4 / 2",
            "var x\nx = 1 < 2",
        ] {
            let code = compile(&wrap(body));
            assert!(code.contains("EXIT int@26"), "no type guard for: {body}");
            assert_labels_consistent(&code);
        }
    }

    #[test]
    fn test_edge_equality_stays_on_stack() {
        let code = compile(&wrap("var x\nx = 1 == 2"));
        assert!(code.contains("EQS"));
        // Equality needs no scratch frame of its own; the only frames come
        // from main itself.
        let eqs_at = code.find("EQS").unwrap();
        let before = &code[..eqs_at];
        assert_eq!(before.matches("CREATEFRAME").count(), 1);
    }

    #[test]
    fn test_edge_not_equal_adds_nots() {
        let code = compile(&wrap("var x\nx = 1 != 2"));
        assert!(code.contains("EQS\nNOTS"));
    }

    #[test]
    fn test_edge_setter_keeps_stack_balanced_for_clears() {
        let code = compile(
            "import \"ifj25\" for Ifj\nclass Program {\n\
             static slot = (value) {\n__s = value\n}\n\
             static main() {\nslot = 1\nslot = 2\n}\n}\n",
        );
        // Each setter call leaves its nil result; the epilogue clears them.
        assert_eq!(code.matches("CALL $setter_slot").count(), 2);
        assert!(code.contains("CLEARS"));
    }

    #[test]
    fn test_edge_deep_expression_nesting() {
        let code = compile(&wrap("var x\nx = ((1 + 2) * (3 + 4)) - ((5 + 6) / (7 + 8))"));
        assert_labels_consistent(&code);
        for op in ["ADDS", "MULS", "SUBS", "DIVS"] {
            assert!(code.contains(op), "missing {op}");
        }
    }

    #[test]
    fn test_edge_write_of_string_literal() {
        let code = compile(&wrap("Ifj.write(\"hi\")"));
        assert!(code.contains("PUSHS string@hi"));
        assert!(code.contains("WRITE LF@tmp"));
    }
}
