//! Inline lowering of the `Ifj` built-ins.
//!
//! Each built-in expands to an inline sequence rather than a `CALL`: it
//! evaluates its arguments in declared order, works inside its own scratch
//! frame, performs its own runtime type checking (`EXIT int@26` for a
//! wrong type, `EXIT int@6` for a non-integer substring index) and pushes
//! exactly one result, matching the stack discipline of user calls.
//!
//! Built-ins that produce a Num convert machine ints back to float before
//! pushing, so their results feed straight into arithmetic.

use ifjc_par::ast::FuncCall;
use ifjc_util::{CompileError, Result};

use crate::emitter::CodeGen;

/// Dispatches on the overload-encoded built-in name.
pub(crate) fn gen_builtin(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    match call.name.as_str() {
        "Ifj.write$1" => gen_write(cg, call),
        "Ifj.read_num$0" => gen_read(cg, "float"),
        "Ifj.read_str$0" => gen_read(cg, "string"),
        "Ifj.floor$1" => gen_floor(cg, call),
        "Ifj.str$1" => gen_str(cg, call),
        "Ifj.length$1" => gen_length(cg, call),
        "Ifj.substring$3" => gen_substring(cg, call),
        "Ifj.strcmp$2" => gen_strcmp(cg, call),
        "Ifj.ord$2" => gen_ord(cg, call),
        "Ifj.chr$1" => gen_chr(cg, call),
        other => Err(CompileError::Internal(format!(
            "unknown built-in '{other}' reached the emitter"
        ))),
    }
}

/// Evaluates the call's arguments in declared order.
fn push_args(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    for arg in &call.args {
        cg.gen_expr(arg)?;
    }
    Ok(())
}

/// `Ifj.write(term)`: whole-valued floats print as integers, everything
/// else prints as-is. Pushes nil as the call result.
fn gen_write(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@tmp");
    cg.emit("DEFVAR LF@tmp2");
    cg.emit("POPS LF@tmp");
    cg.emit("TYPE LF@tmp2 LF@tmp");
    cg.emit(format!("JUMPIFEQ $write_not_int{id} LF@tmp2 string@string"));
    cg.emit(format!("JUMPIFEQ $write_is_int{id} LF@tmp2 string@int"));
    cg.emit(format!("JUMPIFEQ $write_is_float{id} LF@tmp2 string@float"));
    cg.emit(format!("JUMP $write_not_int{id}"));
    cg.emit(format!("LABEL $write_is_float{id}"));
    cg.emit("ISINT LF@tmp2 LF@tmp");
    cg.emit(format!("JUMPIFNEQ $write_not_int{id} LF@tmp2 bool@true"));
    cg.emit("FLOAT2INT LF@tmp LF@tmp");
    cg.emit(format!("LABEL $write_is_int{id}"));
    cg.emit("WRITE LF@tmp");
    cg.emit(format!("JUMP $write_end{id}"));
    cg.emit(format!("LABEL $write_not_int{id}"));
    cg.emit("WRITE LF@tmp");
    cg.emit(format!("LABEL $write_end{id}"));
    cg.emit("POPFRAME");
    cg.emit("PUSHS nil@nil");
    Ok(())
}

/// `Ifj.read_num()` / `Ifj.read_str()`.
fn gen_read(cg: &mut CodeGen<'_>, ty: &str) -> Result<()> {
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@tmp_read");
    cg.emit(format!("READ LF@tmp_read {ty}"));
    cg.emit("PUSHS LF@tmp_read");
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.floor(term)`: truncate to a whole value, staying a float.
fn gen_floor(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@tmp");
    cg.emit("DEFVAR LF@tmp_int");
    cg.emit("DEFVAR LF@type");
    cg.emit("POPS LF@tmp");
    cg.emit("TYPE LF@type LF@tmp");
    cg.emit(format!("JUMPIFEQ $floor_int{id} LF@type string@int"));
    cg.emit(format!("JUMPIFNEQ $floor_err{id} LF@type string@float"));
    cg.emit("FLOAT2INT LF@tmp_int LF@tmp");
    cg.emit("INT2FLOAT LF@tmp LF@tmp_int");
    cg.emit("PUSHS LF@tmp");
    cg.emit(format!("JUMP $floor_end{id}"));
    cg.emit(format!("LABEL $floor_int{id}"));
    cg.emit("INT2FLOAT LF@tmp LF@tmp");
    cg.emit("PUSHS LF@tmp");
    cg.emit(format!("JUMP $floor_end{id}"));
    cg.emit(format!("LABEL $floor_err{id}"));
    cg.emit("EXIT int@26");
    cg.emit(format!("LABEL $floor_end{id}"));
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.str(term)`: numbers render like `write` (whole floats as
/// integers), strings pass through, anything else becomes nil.
fn gen_str(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@tmp");
    cg.emit("DEFVAR LF@type");
    cg.emit("DEFVAR LF@result");
    cg.emit("POPS LF@tmp");
    cg.emit("TYPE LF@type LF@tmp");
    cg.emit(format!("JUMPIFEQ $str_is_float{id} LF@type string@float"));
    cg.emit(format!("JUMPIFEQ $str_int{id} LF@type string@int"));
    cg.emit(format!("JUMPIFEQ $str_str{id} LF@type string@string"));
    cg.emit("MOVE LF@result nil@nil");
    cg.emit(format!("JUMP $str_end{id}"));
    cg.emit(format!("LABEL $str_is_float{id}"));
    cg.emit("ISINT LF@type LF@tmp");
    cg.emit(format!("JUMPIFNEQ $str_frac{id} LF@type bool@true"));
    cg.emit("FLOAT2INT LF@tmp LF@tmp");
    cg.emit(format!("LABEL $str_int{id}"));
    cg.emit("INT2STR LF@result LF@tmp");
    cg.emit(format!("JUMP $str_end{id}"));
    cg.emit(format!("LABEL $str_frac{id}"));
    cg.emit("FLOAT2STR LF@result LF@tmp");
    cg.emit(format!("JUMP $str_end{id}"));
    cg.emit(format!("LABEL $str_str{id}"));
    cg.emit("MOVE LF@result LF@tmp");
    cg.emit(format!("LABEL $str_end{id}"));
    cg.emit("PUSHS LF@result");
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.length(s)`: string length as a float.
fn gen_length(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@tmp");
    cg.emit("DEFVAR LF@result");
    cg.emit("DEFVAR LF@type");
    cg.emit("POPS LF@tmp");
    cg.emit("TYPE LF@type LF@tmp");
    cg.emit(format!("JUMPIFNEQ $len_err{id} LF@type string@string"));
    cg.emit("STRLEN LF@result LF@tmp");
    cg.emit("INT2FLOAT LF@result LF@result");
    cg.emit("PUSHS LF@result");
    cg.emit(format!("JUMP $len_end{id}"));
    cg.emit(format!("LABEL $len_err{id}"));
    cg.emit("EXIT int@26");
    cg.emit(format!("LABEL $len_end{id}"));
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.substring(s, i, j)`: characters `i..j`. A non-numeric index exits
/// 26, a non-integer numeric index exits 6, out-of-range indices push nil.
fn gen_substring(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    for var in [
        "str", "start", "end", "len", "result", "idx", "char", "start_int", "end_int",
        "start_type", "end_type", "loop_cond",
    ] {
        cg.emit(format!("DEFVAR LF@{var}"));
    }
    cg.emit("POPS LF@end");
    cg.emit("POPS LF@start");
    cg.emit("POPS LF@str");
    cg.emit("TYPE LF@start_type LF@start");
    cg.emit("TYPE LF@end_type LF@end");
    cg.emit(format!("JUMPIFNEQ $substr_type_err{id} LF@start_type string@float"));
    cg.emit(format!("JUMPIFNEQ $substr_type_err{id} LF@end_type string@float"));
    cg.emit("ISINT LF@result LF@start");
    cg.emit(format!("JUMPIFEQ $substr_val_err{id} LF@result bool@false"));
    cg.emit("ISINT LF@result LF@end");
    cg.emit(format!("JUMPIFEQ $substr_val_err{id} LF@result bool@false"));
    cg.emit("FLOAT2INT LF@start_int LF@start");
    cg.emit("FLOAT2INT LF@end_int LF@end");
    cg.emit("STRLEN LF@len LF@str");
    cg.emit("LT LF@result LF@start_int int@0");
    cg.emit(format!("JUMPIFEQ $substr_nil{id} LF@result bool@true"));
    cg.emit("LT LF@result LF@end_int int@0");
    cg.emit(format!("JUMPIFEQ $substr_nil{id} LF@result bool@true"));
    cg.emit("GT LF@result LF@start_int LF@end_int");
    cg.emit(format!("JUMPIFEQ $substr_nil{id} LF@result bool@true"));
    cg.emit("LT LF@result LF@start_int LF@len");
    cg.emit(format!("JUMPIFEQ $substr_go{id} LF@result bool@true"));
    cg.emit(format!("JUMP $substr_nil{id}"));
    cg.emit(format!("LABEL $substr_go{id}"));
    cg.emit("GT LF@result LF@end_int LF@len");
    cg.emit(format!("JUMPIFEQ $substr_nil{id} LF@result bool@true"));
    cg.emit("MOVE LF@result string@");
    cg.emit("MOVE LF@idx LF@start_int");
    cg.emit(format!("LABEL $substr_loop{id}"));
    cg.emit("LT LF@loop_cond LF@idx LF@end_int");
    cg.emit(format!("JUMPIFEQ $substr_done{id} LF@loop_cond bool@false"));
    cg.emit("GETCHAR LF@char LF@str LF@idx");
    cg.emit("CONCAT LF@result LF@result LF@char");
    cg.emit("ADD LF@idx LF@idx int@1");
    cg.emit(format!("JUMP $substr_loop{id}"));
    cg.emit(format!("LABEL $substr_done{id}"));
    cg.emit("PUSHS LF@result");
    cg.emit(format!("JUMP $substr_end{id}"));
    cg.emit(format!("LABEL $substr_nil{id}"));
    cg.emit("PUSHS nil@nil");
    cg.emit(format!("JUMP $substr_end{id}"));
    cg.emit(format!("LABEL $substr_type_err{id}"));
    cg.emit("EXIT int@26");
    cg.emit(format!("LABEL $substr_val_err{id}"));
    cg.emit("EXIT int@6");
    cg.emit(format!("LABEL $substr_end{id}"));
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.strcmp(s1, s2)`: -1, 0 or 1 as a float.
fn gen_strcmp(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@str1");
    cg.emit("DEFVAR LF@str2");
    cg.emit("DEFVAR LF@result");
    cg.emit("POPS LF@str2");
    cg.emit("POPS LF@str1");
    cg.emit("LT LF@result LF@str1 LF@str2");
    cg.emit(format!("JUMPIFEQ $strcmp_less{id} LF@result bool@true"));
    cg.emit("GT LF@result LF@str1 LF@str2");
    cg.emit(format!("JUMPIFEQ $strcmp_greater{id} LF@result bool@true"));
    cg.emit("MOVE LF@result float@0x0p+0");
    cg.emit(format!("JUMP $strcmp_end{id}"));
    cg.emit(format!("LABEL $strcmp_less{id}"));
    cg.emit("MOVE LF@result float@-0x1p+0");
    cg.emit(format!("JUMP $strcmp_end{id}"));
    cg.emit(format!("LABEL $strcmp_greater{id}"));
    cg.emit("MOVE LF@result float@0x1p+0");
    cg.emit(format!("LABEL $strcmp_end{id}"));
    cg.emit("PUSHS LF@result");
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.ord(s, i)`: character code at index `i` as a float; nil when the
/// index is out of range.
fn gen_ord(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@str");
    cg.emit("DEFVAR LF@index");
    cg.emit("DEFVAR LF@result");
    cg.emit("DEFVAR LF@type_str");
    cg.emit("DEFVAR LF@type_index");
    cg.emit("DEFVAR LF@len");
    cg.emit("POPS LF@index");
    cg.emit("POPS LF@str");
    cg.emit("TYPE LF@type_str LF@str");
    cg.emit(format!("JUMPIFNEQ $ord_type_err{id} LF@type_str string@string"));
    cg.emit("TYPE LF@type_index LF@index");
    cg.emit(format!("JUMPIFNEQ $ord_type_err{id} LF@type_index string@float"));
    cg.emit("ISINT LF@result LF@index");
    cg.emit(format!("JUMPIFNEQ $ord_type_err{id} LF@result bool@true"));
    cg.emit("FLOAT2INT LF@index LF@index");
    cg.emit("STRLEN LF@len LF@str");
    cg.emit("LT LF@result LF@index int@0");
    cg.emit(format!("JUMPIFEQ $ord_nil{id} LF@result bool@true"));
    cg.emit("LT LF@result LF@index LF@len");
    cg.emit(format!("JUMPIFEQ $ord_ok{id} LF@result bool@true"));
    cg.emit(format!("LABEL $ord_nil{id}"));
    cg.emit("PUSHS nil@nil");
    cg.emit(format!("JUMP $ord_end{id}"));
    cg.emit(format!("LABEL $ord_ok{id}"));
    cg.emit("STRI2INT LF@result LF@str LF@index");
    cg.emit("INT2FLOAT LF@result LF@result");
    cg.emit("PUSHS LF@result");
    cg.emit(format!("JUMP $ord_end{id}"));
    cg.emit(format!("LABEL $ord_type_err{id}"));
    cg.emit("EXIT int@26");
    cg.emit(format!("LABEL $ord_end{id}"));
    cg.emit("POPFRAME");
    Ok(())
}

/// `Ifj.chr(i)`: one-character string for a whole-valued code point.
fn gen_chr(cg: &mut CodeGen<'_>, call: &FuncCall) -> Result<()> {
    push_args(cg, call)?;
    let id = cg.next_label();
    cg.emit("CREATEFRAME");
    cg.emit("PUSHFRAME");
    cg.emit("DEFVAR LF@ascii");
    cg.emit("DEFVAR LF@result");
    cg.emit("DEFVAR LF@type");
    cg.emit("POPS LF@ascii");
    cg.emit("TYPE LF@type LF@ascii");
    cg.emit(format!("JUMPIFEQ $chr_is_int{id} LF@type string@int"));
    cg.emit(format!("JUMPIFNEQ $chr_type_err{id} LF@type string@float"));
    cg.emit("ISINT LF@result LF@ascii");
    cg.emit(format!("JUMPIFNEQ $chr_type_err{id} LF@result bool@true"));
    cg.emit("FLOAT2INT LF@ascii LF@ascii");
    cg.emit(format!("LABEL $chr_is_int{id}"));
    cg.emit("INT2CHAR LF@result LF@ascii");
    cg.emit("PUSHS LF@result");
    cg.emit(format!("JUMP $chr_end{id}"));
    cg.emit(format!("LABEL $chr_type_err{id}"));
    cg.emit("EXIT int@26");
    cg.emit(format!("LABEL $chr_end{id}"));
    cg.emit("POPFRAME");
    Ok(())
}

#[cfg(test)]
mod tests {
    use ifjc_lex::Lexer;
    use ifjc_par::Parser;
    use ifjc_sem::SemanticAnalyzer;

    use crate::emitter::CodeGen;

    fn compile(body: &str) -> String {
        let source = format!(
            "import \"ifj25\" for Ifj\nclass Program {{\nstatic main() {{\n{body}\n}}\n}}\n"
        );
        let mut program = Parser::new(Lexer::new(source.as_bytes()))
            .parse()
            .expect("parse failed");
        let analysis = SemanticAnalyzer::new()
            .analyze(&mut program)
            .expect("analysis failed");
        CodeGen::generate(&program, &analysis).expect("emission failed")
    }

    #[test]
    fn test_write_detects_whole_floats() {
        let code = compile("Ifj.write(5)");
        assert!(code.contains("ISINT"));
        assert!(code.contains("FLOAT2INT LF@tmp LF@tmp"));
        assert!(code.contains("WRITE LF@tmp"));
        // write leaves a nil result like any other call.
        assert!(code.contains("PUSHS nil@nil"));
    }

    #[test]
    fn test_reads_use_the_right_target_type() {
        let code = compile("var n\nn = Ifj.read_num()\nvar s\ns = Ifj.read_str()");
        assert!(code.contains("READ LF@tmp_read float"));
        assert!(code.contains("READ LF@tmp_read string"));
    }

    #[test]
    fn test_length_checks_type_and_returns_float() {
        let code = compile("var n\nn = Ifj.length(\"abc\")");
        assert!(code.contains("STRLEN LF@result LF@tmp"));
        assert!(code.contains("INT2FLOAT LF@result LF@result"));
        assert!(code.contains("EXIT int@26"));
    }

    #[test]
    fn test_substring_error_codes() {
        let code = compile("var s\ns = Ifj.substring(\"abc\", 0, 2)");
        assert!(code.contains("EXIT int@26"));
        assert!(code.contains("EXIT int@6"));
        assert!(code.contains("GETCHAR"));
        // Arguments are pushed s, i, j and popped j, i, s.
        let pops_end = code.find("POPS LF@end").unwrap();
        let pops_start = code.find("POPS LF@start").unwrap();
        let pops_str = code.find("POPS LF@str").unwrap();
        assert!(pops_end < pops_start && pops_start < pops_str);
    }

    #[test]
    fn test_ord_pushes_nil_when_out_of_range() {
        let code = compile("var n\nn = Ifj.ord(\"abc\", 1)");
        assert!(code.contains("STRI2INT"));
        let nil_label = code.find("LABEL $ord_nil").unwrap();
        let nil_push = code[nil_label..].find("PUSHS nil@nil").unwrap();
        assert!(nil_push < 40, "nil must be pushed right at the ord_nil label");
    }

    #[test]
    fn test_strcmp_results_are_floats() {
        let code = compile("var n\nn = Ifj.strcmp(\"a\", \"b\")");
        assert!(code.contains("MOVE LF@result float@0x0p+0"));
        assert!(code.contains("MOVE LF@result float@-0x1p+0"));
        assert!(code.contains("MOVE LF@result float@0x1p+0"));
    }

    #[test]
    fn test_chr_and_floor_type_guards() {
        let code = compile("var s\ns = Ifj.chr(65)\nvar f\nf = Ifj.floor(2.5)");
        assert!(code.contains("INT2CHAR"));
        assert!(code.contains("FLOAT2INT LF@tmp_int LF@tmp"));
        assert!(code.contains("INT2FLOAT LF@tmp LF@tmp_int"));
    }

    #[test]
    fn test_str_conversion_paths() {
        let code = compile("var s\ns = Ifj.str(3.5)");
        assert!(code.contains("INT2STR"));
        assert!(code.contains("FLOAT2STR"));
    }
}
