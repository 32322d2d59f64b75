//! Expression lowering.
//!
//! Postorder over the expression tree: leaves push their value onto the
//! operand stack, binary operators pop both operands into a scratch frame,
//! type-check them at run time, and push the result. Equality works
//! directly on the stack; everything else needs the frame.
//!
//! Machine integers can reach the stack (string length, character codes),
//! so every arithmetic and relational sequence first normalizes an `int`
//! operand to `float` the way division always had to.

use ifjc_par::expr::{BinOp, Expr, TypeTag};
use ifjc_util::Result;

use crate::emitter::CodeGen;
use crate::value::{escape_string, hex_float};

/// The `string@` operand naming the runtime type of a type literal.
fn type_tag_operand(tag: TypeTag) -> &'static str {
    match tag {
        TypeTag::Num => "string@float",
        TypeTag::String => "string@string",
        TypeTag::Null => "string@nil",
    }
}

impl CodeGen<'_> {
    /// Lowers `expr`, leaving exactly one value on the operand stack.
    pub(crate) fn gen_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Num(value) => {
                self.emit(format!("PUSHS float@{}", hex_float(*value)));
                Ok(())
            }
            Expr::Str(bytes) => {
                self.emit(format!("PUSHS string@{}", escape_string(bytes)));
                Ok(())
            }
            Expr::Null => {
                self.emit("PUSHS nil@nil");
                Ok(())
            }
            Expr::TypeLit(tag) => {
                self.emit(format!("PUSHS {}", type_tag_operand(*tag)));
                Ok(())
            }
            Expr::Ident { name, scope } => {
                let frame_ref = self.frame_ref(name, *scope)?;
                self.emit(format!("PUSHS {frame_ref}"));
                Ok(())
            }
            Expr::GetterCall { name } => {
                self.emit(format!("CALL $getter_{name}"));
                Ok(())
            }
            Expr::Binary { op, left, right } => {
                self.gen_expr(left)?;
                self.gen_expr(right)?;
                self.gen_binary_op(*op)
            }
        }
    }

    fn gen_binary_op(&mut self, op: BinOp) -> Result<()> {
        match op {
            BinOp::Eq => {
                self.emit("EQS");
                Ok(())
            }
            BinOp::NotEq => {
                self.emit("EQS");
                self.emit("NOTS");
                Ok(())
            }
            BinOp::Is => self.gen_is(),
            BinOp::Add => self.gen_add(),
            BinOp::Sub => self.gen_numeric("sub", "SUBS"),
            BinOp::Div => self.gen_div(),
            BinOp::Mul => self.gen_mul(),
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => self.gen_relational(op),
        }
    }

    /// `is`: the type tag sits on top of the stack above the tested value;
    /// a TYPE comparison decides the boolean result.
    fn gen_is(&mut self) -> Result<()> {
        let id = self.next_label();
        self.emit("CREATEFRAME");
        self.emit("PUSHFRAME");
        self.emit("DEFVAR LF@op1");
        self.emit("DEFVAR LF@typeIn");
        self.emit("DEFVAR LF@type1");
        self.emit("POPS LF@typeIn");
        self.emit("POPS LF@op1");
        self.emit("TYPE LF@type1 LF@op1");
        self.emit(format!("JUMPIFEQ $is_true_{id} LF@typeIn LF@type1"));
        self.emit("PUSHS bool@false");
        self.emit(format!("JUMP $is_end_{id}"));
        self.emit(format!("LABEL $is_true_{id}"));
        self.emit("PUSHS bool@true");
        self.emit(format!("LABEL $is_end_{id}"));
        self.emit("POPFRAME");
        Ok(())
    }

    /// Opens the scratch frame and pops both operands with their types.
    fn open_operand_frame(&mut self) {
        self.emit("CREATEFRAME");
        self.emit("PUSHFRAME");
        self.emit("DEFVAR LF@op1");
        self.emit("DEFVAR LF@op2");
        self.emit("DEFVAR LF@type1");
        self.emit("DEFVAR LF@type2");
        self.emit("DEFVAR LF@result");
        self.emit("POPS LF@op2");
        self.emit("POPS LF@op1");
        self.emit("TYPE LF@type1 LF@op1");
        self.emit("TYPE LF@type2 LF@op2");
    }

    /// Bool operands are never valid arithmetic/relational input.
    fn reject_bools(&mut self, err_label: &str) {
        self.emit(format!("JUMPIFEQ {err_label} LF@type1 string@bool"));
        self.emit(format!("JUMPIFEQ {err_label} LF@type2 string@bool"));
    }

    /// Converts one operand to float if it arrived as a machine int.
    fn normalize_int(&mut self, operand: u8, skip_label: &str) {
        self.emit(format!("JUMPIFNEQ {skip_label} LF@type{operand} string@int"));
        self.emit(format!("INT2FLOAT LF@op{operand} LF@op{operand}"));
        self.emit(format!("MOVE LF@type{operand} string@float"));
        self.emit(format!("LABEL {skip_label}"));
    }

    /// `+`: float addition or string concatenation; anything else exits 26.
    fn gen_add(&mut self) -> Result<()> {
        let id = self.next_label();
        self.open_operand_frame();
        self.reject_bools(&format!("$add_err_{id}"));
        self.normalize_int(1, &format!("$add_lhs_{id}"));
        self.normalize_int(2, &format!("$add_rhs_{id}"));
        self.emit(format!("JUMPIFEQ $add_str_{id} LF@type1 string@string"));
        self.emit(format!("JUMPIFNEQ $add_err_{id} LF@type1 string@float"));
        self.emit(format!("JUMPIFNEQ $add_err_{id} LF@type2 string@float"));
        self.emit("PUSHS LF@op1");
        self.emit("PUSHS LF@op2");
        self.emit("ADDS");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $add_end_{id}"));
        self.emit(format!("LABEL $add_str_{id}"));
        self.emit(format!("JUMPIFNEQ $add_err_{id} LF@type2 string@string"));
        self.emit("CONCAT LF@result LF@op1 LF@op2");
        self.emit("PUSHS LF@result");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $add_end_{id}"));
        self.emit(format!("LABEL $add_err_{id}"));
        self.emit("EXIT int@26");
        self.emit(format!("LABEL $add_end_{id}"));
        Ok(())
    }

    /// `-` (and the shared shape for purely numeric operators): both
    /// operands must be floats after normalization.
    fn gen_numeric(&mut self, stem: &str, stack_op: &str) -> Result<()> {
        let id = self.next_label();
        self.open_operand_frame();
        self.reject_bools(&format!("${stem}_err_{id}"));
        self.normalize_int(1, &format!("${stem}_lhs_{id}"));
        self.normalize_int(2, &format!("${stem}_rhs_{id}"));
        self.emit(format!("JUMPIFNEQ ${stem}_err_{id} LF@type1 string@float"));
        self.emit(format!("JUMPIFNEQ ${stem}_err_{id} LF@type2 string@float"));
        self.emit("PUSHS LF@op1");
        self.emit("PUSHS LF@op2");
        self.emit(stack_op);
        self.emit("POPFRAME");
        self.emit(format!("JUMP ${stem}_end_{id}"));
        self.emit(format!("LABEL ${stem}_err_{id}"));
        self.emit("EXIT int@26");
        self.emit(format!("LABEL ${stem}_end_{id}"));
        Ok(())
    }

    /// `/`: float division with a zero-divisor guard that pushes nil.
    fn gen_div(&mut self) -> Result<()> {
        let id = self.next_label();
        self.open_operand_frame();
        self.reject_bools(&format!("$div_err_{id}"));
        self.normalize_int(1, &format!("$div_lhs_{id}"));
        self.normalize_int(2, &format!("$div_rhs_{id}"));
        self.emit(format!("JUMPIFNEQ $div_err_{id} LF@type1 string@float"));
        self.emit(format!("JUMPIFNEQ $div_err_{id} LF@type2 string@float"));
        self.emit("PUSHS LF@op2");
        self.emit("PUSHS float@0x0p+0");
        self.emit("EQS");
        self.emit("PUSHS bool@true");
        self.emit(format!("JUMPIFEQS $div_zero_{id}"));
        self.emit("PUSHS LF@op1");
        self.emit("PUSHS LF@op2");
        self.emit("DIVS");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $div_end_{id}"));
        self.emit(format!("LABEL $div_zero_{id}"));
        self.emit("PUSHS nil@nil");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $div_end_{id}"));
        self.emit(format!("LABEL $div_err_{id}"));
        self.emit("EXIT int@26");
        self.emit(format!("LABEL $div_end_{id}"));
        Ok(())
    }

    /// `*`: float multiplication, or string repetition when the left
    /// operand is a string and the right a non-negative whole number.
    fn gen_mul(&mut self) -> Result<()> {
        let id = self.next_label();
        self.open_operand_frame();
        self.reject_bools(&format!("$mul_err_{id}"));
        self.normalize_int(2, &format!("$mul_rhs_{id}"));
        self.emit(format!("JUMPIFEQ $mul_str_{id} LF@type1 string@string"));
        self.normalize_int(1, &format!("$mul_lhs_{id}"));
        self.emit(format!("JUMPIFNEQ $mul_err_{id} LF@type1 string@float"));
        self.emit(format!("JUMPIFNEQ $mul_err_{id} LF@type2 string@float"));
        self.emit("PUSHS LF@op1");
        self.emit("PUSHS LF@op2");
        self.emit("MULS");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $mul_end_{id}"));

        // String repetition: the count must be a whole, non-negative number.
        self.emit(format!("LABEL $mul_str_{id}"));
        self.emit(format!("JUMPIFNEQ $mul_err_{id} LF@type2 string@float"));
        self.emit("ISINT LF@result LF@op2");
        self.emit(format!("JUMPIFEQ $mul_err_{id} LF@result bool@false"));
        self.emit("DEFVAR LF@count");
        self.emit("DEFVAR LF@iter");
        self.emit("DEFVAR LF@cmp");
        self.emit("FLOAT2INT LF@count LF@op2");
        self.emit("LT LF@result LF@count int@0");
        self.emit(format!("JUMPIFEQ $mul_err_{id} LF@result bool@true"));
        self.emit("MOVE LF@result string@");
        self.emit("MOVE LF@iter int@0");
        self.emit(format!("LABEL $mul_loop_{id}"));
        self.emit("LT LF@cmp LF@iter LF@count");
        self.emit(format!("JUMPIFEQ $mul_done_{id} LF@cmp bool@false"));
        self.emit("CONCAT LF@result LF@result LF@op1");
        self.emit("ADD LF@iter LF@iter int@1");
        self.emit(format!("JUMP $mul_loop_{id}"));
        self.emit(format!("LABEL $mul_done_{id}"));
        self.emit("PUSHS LF@result");
        self.emit("POPFRAME");
        self.emit(format!("JUMP $mul_end_{id}"));

        self.emit(format!("LABEL $mul_err_{id}"));
        self.emit("EXIT int@26");
        self.emit(format!("LABEL $mul_end_{id}"));
        Ok(())
    }

    /// Relational operators: same type on both sides, no bools. `<=` and
    /// `>=` are the negations of the opposite strict comparisons.
    fn gen_relational(&mut self, op: BinOp) -> Result<()> {
        let id = self.next_label();
        self.open_operand_frame();
        self.reject_bools(&format!("$rel_err_{id}"));
        self.normalize_int(1, &format!("$rel_lhs_{id}"));
        self.normalize_int(2, &format!("$rel_rhs_{id}"));
        self.emit(format!("JUMPIFEQ $rel_ok_{id} LF@type1 LF@type2"));
        self.emit(format!("LABEL $rel_err_{id}"));
        self.emit("EXIT int@26");
        self.emit(format!("LABEL $rel_ok_{id}"));
        self.emit("PUSHS LF@op1");
        self.emit("PUSHS LF@op2");
        match op {
            BinOp::Lt => self.emit("LTS"),
            BinOp::Gt => self.emit("GTS"),
            BinOp::LtEq => {
                self.emit("GTS");
                self.emit("NOTS");
            }
            BinOp::GtEq => {
                self.emit("LTS");
                self.emit("NOTS");
            }
            _ => {
                return Err(ifjc_util::CompileError::Internal(format!(
                    "{op:?} is not a relational operator"
                )))
            }
        }
        self.emit("POPFRAME");
        Ok(())
    }
}
