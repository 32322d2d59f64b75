//! End-to-end tests of the `ifjc` binary: source on stdin, generated code
//! on stdout, the error category as the exit code.

use assert_cmd::Command;
use predicates::prelude::*;

fn ifjc() -> Command {
    Command::cargo_bin("ifjc").expect("ifjc binary not built")
}

const FACTORIAL: &str = "\
import \"ifj25\" for Ifj
class Program {
static main() {
var n
n = 5
var r
r = 1
while (n > 0) {
r = r * n
n = n - 1
}
Ifj.write(r)
}
}
";

#[test]
fn test_successful_compile_writes_program() {
    ifjc()
        .write_stdin(FACTORIAL)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(".IFJcode25\n"))
        .stdout(predicate::str::contains("LABEL $$main"))
        .stdout(predicate::str::contains("EXIT int@0"));
}

#[test]
fn test_lexical_error_exits_1() {
    ifjc()
        .write_stdin("import \"ifj25\" for Ifj\nclass Program {\nstatic main() {\nvar _x\n}\n}\n")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_syntax_error_exits_2() {
    ifjc()
        .write_stdin("import \"ifj25\" for Ifj\nclass Wrong {\n}\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_undefined_function_exits_3() {
    ifjc()
        .write_stdin(
            "import \"ifj25\" for Ifj\nclass Program {\nstatic main() {\nvar x\nx = nope()\n}\n}\n",
        )
        .assert()
        .code(3);
}

#[test]
fn test_type_error_exits_6() {
    ifjc()
        .write_stdin(
            "import \"ifj25\" for Ifj\nclass Program {\nstatic main() {\nvar s\ns = \"a\" + 1\n}\n}\n",
        )
        .assert()
        .code(6);
}

#[test]
fn test_empty_input_exits_2() {
    ifjc().write_stdin("").assert().code(2);
}
