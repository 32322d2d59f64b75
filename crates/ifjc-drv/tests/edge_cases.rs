//! Error-category coverage across the whole pipeline.

use ifjc_drv::compile;

fn code_of(source: &str) -> i32 {
    match compile(source) {
        Ok(_) => 0,
        Err(err) => err.exit_code(),
    }
}

fn wrap(body: &str) -> String {
    format!("import \"ifj25\" for Ifj\nclass Program {{\nstatic main() {{\n{body}\n}}\n}}\n")
}

#[test]
fn test_success_is_zero() {
    assert_eq!(code_of(&wrap("var x\nx = 1")), 0);
}

#[test]
fn test_lexical_errors_are_1() {
    assert_eq!(code_of(&wrap("var x\nx = 0x")), 1);
    assert_eq!(code_of(&wrap("var x\nx = 1e")), 1);
    assert_eq!(code_of(&wrap("var x\nx = 1e+")), 1);
    assert_eq!(code_of(&wrap("var _x")), 1);
    assert_eq!(code_of(&wrap("var x\nx = \"a\nb\"")), 1);
    assert_eq!(code_of(&wrap("var x\nx = \"\\q\"")), 1);
}

#[test]
fn test_multiline_string_accepts_newlines() {
    assert_eq!(code_of(&wrap("var x\nx = \"\"\"a\nb\"\"\"")), 0);
}

#[test]
fn test_syntax_errors_are_2() {
    assert_eq!(code_of("class Program {\nstatic main() {\n}\n}\n"), 2);
    assert_eq!(code_of(&wrap("var x\nx = ")), 2);
    assert_eq!(code_of(&wrap("if (1 > 0) {\nvar y\n}")), 2);
    assert_eq!(code_of(&wrap("var x\nx 5")), 2);
}

#[test]
fn test_undefined_symbols_are_3() {
    assert_eq!(code_of(&wrap("var x\nx = nope()")), 3);
    assert_eq!(code_of(&wrap("x = 1")), 3);
    assert_eq!(
        code_of("import \"ifj25\" for Ifj\nclass Program {\nstatic f() {\nvar x\n}\n}\n"),
        3
    );
}

#[test]
fn test_redefinitions_are_4() {
    assert_eq!(code_of(&wrap("var x\nvar x")), 4);
    let dup_param = "import \"ifj25\" for Ifj\nclass Program {\n\
                     static f(a, a) {\nvar x\n}\n\
                     static main() {\nvar x\n}\n}\n";
    assert_eq!(code_of(dup_param), 4);
}

#[test]
fn test_wrong_parameters_are_5() {
    let arity = "import \"ifj25\" for Ifj\nclass Program {\n\
                 static foo(a, b) {\nvar x\n}\n\
                 static main() {\nfoo(1)\n}\n}\n";
    assert_eq!(code_of(arity), 5);
    assert_eq!(code_of(&wrap("var n\nn = Ifj.length(5)")), 5);
}

#[test]
fn test_type_compatibility_is_6() {
    assert_eq!(code_of(&wrap("var s\ns = \"a\" + 1")), 6);
    assert_eq!(code_of(&wrap("if (\"s\") {\nvar a\n} else {\nvar b\n}")), 6);
}

#[test]
fn test_other_semantic_is_10() {
    assert_eq!(code_of(&wrap("var x\nvar y\ny = x")), 10);
}

#[test]
fn test_hex_and_exponent_literals_compile() {
    let code = compile(&wrap("var x\nx = 0x10\nvar y\ny = 2.5e2")).unwrap();
    // 16 and 250 as hex floats.
    assert!(code.contains("PUSHS float@0x1p+4"));
    assert!(code.contains("PUSHS float@0x1.f4p+7"));
}

#[test]
fn test_comments_are_invisible() {
    let source = "import \"ifj25\" for Ifj\n// leading comment\nclass Program {\n\
                  static main() {\n/* block /* nested */ comment */ var x\nx = 1 // trailing\n}\n}\n";
    assert_eq!(code_of(source), 0);
}
