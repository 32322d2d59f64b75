//! AST-walking code emission.
//!
//! Output layout: the `.IFJcode25` header, `DEFVAR`/`MOVE` pairs for every
//! global-scope variable, `JUMP $$main`, then each definition in program
//! order, then the program epilogue (`LABEL $endprog`, `CLEARS`,
//! `EXIT int@0`).
//!
//! Every definition except `main` is wrapped in a jump over its body and
//! ends with the default tail `PUSHS nil@nil` / `POPFRAME` / `RETURN`.
//! `main` is reached by `JUMP`, not `CALL`, so it is emitted in place
//! under `$$main` with no jump-over and no `RETURN`: when it finishes (or
//! executes a `return`, which lowers to a jump) control reaches the
//! epilogue by falling through the remaining definitions' jump-overs.

use indexmap::IndexSet;

use ifjc_par::ast::{Block, Def, FuncCall, LocalDecl, Param, Program, Rhs, Stmt};
use ifjc_sem::Analysis;
use ifjc_util::{CompileError, Result, ScopeId};

use crate::builtins;

/// The code emitter. One per compilation; holds the label counter and the
/// per-frame bookkeeping.
pub struct CodeGen<'a> {
    pub(crate) analysis: &'a Analysis,
    pub(crate) out: String,
    labels: u32,
    /// Frame references already declared in the current frame, so a name
    /// shadowed at the same depth in sibling blocks is defined once.
    frame_vars: IndexSet<String>,
    /// Inside `main`, `return` lowers to a jump to the epilogue instead of
    /// a `RETURN` (the call stack is empty there).
    in_main: bool,
}

impl<'a> CodeGen<'a> {
    /// Lowers a semantically valid program to IFJcode25 text.
    pub fn generate(program: &Program, analysis: &'a Analysis) -> Result<String> {
        let mut cg = CodeGen {
            analysis,
            out: String::new(),
            labels: 0,
            frame_vars: IndexSet::new(),
            in_main: false,
        };

        cg.emit(".IFJcode25");
        cg.gen_globals();
        cg.emit("JUMP $$main");

        for def in &program.defs {
            cg.gen_def(def)?;
        }

        cg.emit("LABEL $endprog");
        cg.emit("CLEARS");
        cg.emit("EXIT int@0");
        Ok(cg.out)
    }

    pub(crate) fn emit(&mut self, line: impl AsRef<str>) {
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    /// A fresh suffix for generated control-flow labels.
    pub(crate) fn next_label(&mut self) -> u32 {
        let id = self.labels;
        self.labels += 1;
        id
    }

    /// The frame reference of a resolved variable: `GF@name` for globals
    /// (double-underscore names), `LF@name$depth` otherwise, where the
    /// depth suffix disambiguates names shadowed across nesting levels.
    pub(crate) fn frame_ref(&self, name: &str, scope: Option<ScopeId>) -> Result<String> {
        if name.starts_with("__") {
            return Ok(format!("GF@{name}"));
        }
        let scope = scope.ok_or_else(|| {
            CompileError::Internal(format!("variable '{name}' has no resolved scope"))
        })?;
        Ok(format!("LF@{name}${}", self.analysis.depth(scope)))
    }

    /// Declares every global-scope variable up front, initialized to nil.
    fn gen_globals(&mut self) {
        let global = self.analysis.global;
        let mut lines = Vec::new();
        for (key, symbol) in &self.analysis.scopes.scope(global).symbols {
            if matches!(symbol, ifjc_sem::Symbol::Var(_)) {
                lines.push(format!("DEFVAR GF@{key}"));
                lines.push(format!("MOVE GF@{key} nil@nil"));
            }
        }
        for line in lines {
            self.emit(line);
        }
    }

    fn gen_def(&mut self, def: &Def) -> Result<()> {
        self.frame_vars.clear();
        match def {
            Def::Main(f) => {
                self.in_main = true;
                self.emit("LABEL $$main");
                self.emit("CREATEFRAME");
                self.emit("PUSHFRAME");
                self.gen_locals(&f.locals)?;
                self.gen_block(&f.body)?;
                self.emit("POPFRAME");
                // Falls through the remaining definitions' jump-overs to
                // the epilogue.
                self.in_main = false;
            }
            Def::Function(f) => {
                self.emit(format!("JUMP $endfunc_{}", f.name));
                self.emit(format!("LABEL $func_{}", f.name));
                self.emit("CREATEFRAME");
                self.emit("PUSHFRAME");
                self.gen_locals(&f.locals)?;
                self.gen_params(&f.params)?;
                self.gen_block(&f.body)?;
                self.emit("PUSHS nil@nil");
                self.emit("POPFRAME");
                self.emit("RETURN");
                self.emit(format!("LABEL $endfunc_{}", f.name));
            }
            Def::Getter(g) => {
                self.emit(format!("JUMP $endgetter_{}", g.name));
                self.emit(format!("LABEL $getter_{}", g.name));
                self.emit("CREATEFRAME");
                self.emit("PUSHFRAME");
                self.gen_locals(&g.locals)?;
                self.gen_block(&g.body)?;
                self.emit("PUSHS nil@nil");
                self.emit("POPFRAME");
                self.emit("RETURN");
                self.emit(format!("LABEL $endgetter_{}", g.name));
            }
            Def::Setter(s) => {
                self.emit(format!("JUMP $endsetter_{}", s.name));
                self.emit(format!("LABEL $setter_{}", s.name));
                self.emit("CREATEFRAME");
                self.emit("PUSHFRAME");
                self.gen_locals(&s.locals)?;
                self.gen_params(std::slice::from_ref(&s.param))?;
                self.gen_block(&s.body)?;
                self.emit("PUSHS nil@nil");
                self.emit("POPFRAME");
                self.emit("RETURN");
                self.emit(format!("LABEL $endsetter_{}", s.name));
            }
        }
        Ok(())
    }

    /// Hoists every local declaration of the definition to frame entry.
    fn gen_locals(&mut self, locals: &[LocalDecl]) -> Result<()> {
        for local in locals {
            let frame_ref = self.frame_ref(&local.name, Some(local.scope))?;
            if self.frame_vars.insert(frame_ref.clone()) {
                self.emit(format!("DEFVAR {frame_ref}"));
            }
        }
        Ok(())
    }

    /// Receives parameters in declared order; the caller pushed the
    /// arguments last-first, so each `POPS` takes the matching one.
    fn gen_params(&mut self, params: &[Param]) -> Result<()> {
        for param in params {
            let frame_ref = self.frame_ref(&param.name, param.scope)?;
            self.emit(format!("DEFVAR {frame_ref}"));
            self.emit(format!("POPS {frame_ref}"));
        }
        Ok(())
    }

    fn gen_block(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.stmts {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            // Handled at frame entry by gen_locals.
            Stmt::VarDecl { .. } => Ok(()),

            Stmt::Assign { target, scope, rhs } => {
                self.gen_rhs(rhs)?;
                let frame_ref = self.frame_ref(target, *scope)?;
                self.emit(format!("POPS {frame_ref}"));
                Ok(())
            }

            Stmt::SetterCall { name, arg } => {
                self.gen_rhs(arg)?;
                self.emit(format!("CALL $setter_{name}"));
                // The setter's nil return value stays on the operand
                // stack; the epilogue's CLEARS discards it.
                Ok(())
            }

            Stmt::Call(call) => self.gen_call(call),

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => self.gen_if(cond, then_block, else_block),

            Stmt::While { cond, body } => {
                let id = self.next_label();
                self.emit(format!("LABEL $while{id}"));
                self.gen_rhs(cond)?;
                self.emit("PUSHS bool@false");
                self.emit(format!("JUMPIFEQS $endwhile{id}"));
                self.gen_block(body)?;
                self.emit(format!("JUMP $while{id}"));
                self.emit(format!("LABEL $endwhile{id}"));
                Ok(())
            }

            Stmt::Return { value, .. } => {
                match value {
                    Some(rhs) => self.gen_rhs(rhs)?,
                    None => self.emit("PUSHS nil@nil"),
                }
                self.emit("POPFRAME");
                if self.in_main {
                    self.emit("JUMP $endprog");
                } else {
                    self.emit("RETURN");
                }
                Ok(())
            }

            Stmt::Block(block) => self.gen_block(block),
        }
    }

    /// Condition truthiness is decided in a scratch frame: nil and
    /// bool@false are false, any other value is true. The scratch frame is
    /// popped before either branch runs.
    fn gen_if(&mut self, cond: &Rhs, then_block: &Block, else_block: &Block) -> Result<()> {
        self.gen_rhs(cond)?;
        let id = self.next_label();

        self.emit("CREATEFRAME");
        self.emit("PUSHFRAME");
        self.emit("DEFVAR LF@__if_cond");
        self.emit("DEFVAR LF@__if_type");
        self.emit("POPS LF@__if_cond");
        self.emit("TYPE LF@__if_type LF@__if_cond");
        self.emit("PUSHS LF@__if_type");
        self.emit("PUSHS string@nil");
        self.emit(format!("JUMPIFEQS $else{id}"));
        self.emit("PUSHS LF@__if_type");
        self.emit("PUSHS string@bool");
        self.emit(format!("JUMPIFNEQS $then{id}"));
        self.emit("PUSHS LF@__if_cond");
        self.emit("PUSHS bool@false");
        self.emit(format!("JUMPIFEQS $else{id}"));
        self.emit(format!("LABEL $then{id}"));
        self.emit("POPFRAME");
        self.gen_block(then_block)?;
        self.emit(format!("JUMP $endif{id}"));
        self.emit(format!("LABEL $else{id}"));
        self.emit("POPFRAME");
        self.gen_block(else_block)?;
        self.emit(format!("LABEL $endif{id}"));
        Ok(())
    }

    pub(crate) fn gen_rhs(&mut self, rhs: &Rhs) -> Result<()> {
        match rhs {
            Rhs::Expr(expr) => self.gen_expr(expr),
            Rhs::Call(call) => self.gen_call(call),
        }
    }

    /// Lowers a call, leaving its result on the operand stack. Built-ins
    /// are expanded inline; user calls push their arguments last-first so
    /// the callee pops them in declared order.
    pub(crate) fn gen_call(&mut self, call: &FuncCall) -> Result<()> {
        if call.name.starts_with("Ifj.") {
            return builtins::gen_builtin(self, call);
        }
        for arg in call.args.iter().rev() {
            self.gen_expr(arg)?;
        }
        self.emit(format!("CALL $func_{}", call.name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifjc_lex::Lexer;
    use ifjc_par::Parser;
    use ifjc_sem::SemanticAnalyzer;
    use ifjc_util::FxHashMap;

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

    /// Every generated label must be defined exactly once and every jump
    /// or call target must be defined.
    fn check_labels(code: &str) {
        let mut defined: FxHashMap<&str, u32> = FxHashMap::default();
        let mut used: Vec<&str> = Vec::new();
        for line in code.lines() {
            let mut words = line.split_whitespace();
            match words.next() {
                Some("LABEL") => {
                    let label = words.next().expect("LABEL without operand");
                    *defined.entry(label).or_insert(0) += 1;
                }
                Some("JUMP" | "JUMPIFEQS" | "JUMPIFNEQS" | "JUMPIFEQ" | "JUMPIFNEQ" | "CALL") => {
                    used.push(words.next().expect("jump without target"));
                }
                _ => {}
            }
        }
        for (label, count) in &defined {
            assert_eq!(*count, 1, "label {label} defined {count} times");
        }
        for target in used {
            assert!(defined.contains_key(target), "undefined jump target {target}");
        }
    }

    /// Every `LF@` reference must be textually preceded by a DEFVAR of the
    /// same name (scratch frames reuse names, so this approximates the
    /// per-frame invariant without tracking control flow).
    fn check_defvar_before_use(code: &str) {
        let mut first_def: FxHashMap<&str, usize> = FxHashMap::default();
        for (idx, line) in code.lines().enumerate() {
            let mut words = line.split_whitespace();
            let opcode = words.next();
            if opcode == Some("DEFVAR") {
                let var = words.next().expect("DEFVAR without operand");
                if let Some(name) = var.strip_prefix("LF@") {
                    first_def.entry(name).or_insert(idx);
                }
                continue;
            }
            for word in words {
                if let Some(name) = word.strip_prefix("LF@") {
                    let defined = first_def.get(name).copied();
                    assert!(
                        defined.is_some_and(|def_idx| def_idx < idx),
                        "use of LF@{name} before any DEFVAR in: {line}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_header_globals_and_epilogue() {
        let code = compile(&wrap("__g = 1"));
        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(lines[0], ".IFJcode25");
        assert_eq!(lines[1], "DEFVAR GF@__g");
        assert_eq!(lines[2], "MOVE GF@__g nil@nil");
        assert_eq!(lines[3], "JUMP $$main");
        assert!(code.ends_with("LABEL $endprog\nCLEARS\nEXIT int@0\n"));
    }

    #[test]
    fn test_factorial_shape() {
        let code = compile(&wrap(
            "var n\nn = 5\nvar r\nr = 1\nwhile (n > 0) {\nr = r * n\nn = n - 1\n}\nIfj.write(r)",
        ));
        check_labels(&code);
        check_defvar_before_use(&code);
        assert!(code.contains("LABEL $$main"));
        assert!(code.contains("DEFVAR LF@n$2"));
        assert!(code.contains("DEFVAR LF@r$2"));
        assert!(code.contains("PUSHS float@0x1.4p+2"));
        assert!(code.contains("MULS"));
        assert!(code.contains("SUBS"));
        assert!(code.contains("LABEL $while0") || code.contains("LABEL $while1"));
        assert!(code.contains("WRITE"));
    }

    #[test]
    fn test_main_has_no_jump_over_and_no_return() {
        let code = compile(&wrap("var x\nx = 1"));
        assert!(!code.contains("JUMP $endmain"));
        assert!(!code.contains("RETURN"));
        // main's POPFRAME falls through to the epilogue.
        let main_at = code.find("LABEL $$main").unwrap();
        let epilogue_at = code.find("LABEL $endprog").unwrap();
        assert!(main_at < epilogue_at);
    }

    #[test]
    fn test_return_in_main_jumps_to_epilogue() {
        let code = compile(&wrap("return"));
        assert!(code.contains("JUMP $endprog"));
        assert!(!code.contains("\nRETURN\n"));
    }

    #[test]
    fn test_function_wrapping_and_call_protocol() {
        let code = compile(
            "import \"ifj25\" for Ifj\nclass Program {\n\
             static add(a, b) {\nreturn a + b\n}\n\
             static main() {\nvar s\ns = add(1, 2)\n}\n\
             }\n",
        );
        check_labels(&code);
        check_defvar_before_use(&code);
        assert!(code.contains("JUMP $endfunc_add$2"));
        assert!(code.contains("LABEL $func_add$2"));
        // Caller pushes 2 then 1; callee pops a then b.
        let call_at = code.find("CALL $func_add$2").unwrap();
        let before = &code[..call_at];
        let two_at = before.rfind("PUSHS float@0x1p+1").unwrap();
        let one_at = before.rfind("PUSHS float@0x1p+0").unwrap();
        assert!(two_at < one_at, "arguments must be pushed last-first");
        let func_at = code.find("LABEL $func_add$2").unwrap();
        let a_at = code[func_at..].find("POPS LF@a$2").unwrap();
        let b_at = code[func_at..].find("POPS LF@b$2").unwrap();
        assert!(a_at < b_at, "parameters pop in declared order");
        // Default tail.
        assert!(code.contains("PUSHS nil@nil\nPOPFRAME\nRETURN"));
    }

    #[test]
    fn test_getter_lowering() {
        let code = compile(
            "import \"ifj25\" for Ifj\nclass Program {\n\
             static count {\nreturn 7\n}\n\
             static main() {\nvar v\nv = count\n}\n\
             }\n",
        );
        check_labels(&code);
        assert!(code.contains("LABEL $getter_count"));
        assert!(code.contains("CALL $getter_count"));
        assert!(code.contains("POPS LF@v$2"));
    }

    #[test]
    fn test_setter_lowering() {
        let code = compile(
            "import \"ifj25\" for Ifj\nclass Program {\n\
             static count = (value) {\n__backing = value\n}\n\
             static main() {\ncount = 7\n}\n\
             }\n",
        );
        check_labels(&code);
        assert!(code.contains("LABEL $setter_count"));
        assert!(code.contains("POPS LF@value$2"));
        assert!(code.contains("CALL $setter_count"));
    }

    #[test]
    fn test_if_else_truthiness_frame() {
        let code = compile(&wrap(
            "var x\nx = 1\nif (x > 0) {\nx = 2\n} else {\nx = 3\n}",
        ));
        check_labels(&code);
        assert!(code.contains("DEFVAR LF@__if_cond"));
        assert!(code.contains("PUSHS string@nil"));
        assert!(code.contains("PUSHS string@bool"));
        for stem in ["$then", "$else", "$endif"] {
            assert!(code.contains(stem), "missing {stem} label family");
        }
    }

    #[test]
    fn test_shadowed_names_get_distinct_depths() {
        let code = compile(&wrap("var x\nx = 1\n{\nvar x\nx = 2\n}"));
        assert!(code.contains("DEFVAR LF@x$2"));
        assert!(code.contains("DEFVAR LF@x$3"));
    }

    #[test]
    fn test_duplicate_declarations_in_sibling_blocks_defined_once() {
        let code = compile(&wrap(
            "{\nvar t\nt = 1\n}\n{\nvar t\nt = 2\n}",
        ));
        let count = code.matches("DEFVAR LF@t$3").count();
        assert_eq!(count, 1, "same name and depth must be declared once");
    }

    #[test]
    fn test_string_literal_escaping_in_output() {
        let code = compile(&wrap("Ifj.write(\"a b\\n#\\\\\")"));
        assert!(code.contains("PUSHS string@a\\032b\\010\\035\\092"));
    }

    #[test]
    fn test_string_concat_uses_concat() {
        let code = compile(&wrap("var s\ns = \"a\" + \"b\"\nIfj.write(s)"));
        check_labels(&code);
        assert!(code.contains("CONCAT"));
    }

    #[test]
    fn test_is_operator_lowering() {
        let code = compile(&wrap("var x\nx = 1\nvar y\ny = x is Num"));
        check_labels(&code);
        assert!(code.contains("PUSHS string@float"));
        assert!(code.contains("TYPE LF@type1 LF@op1"));
    }

    #[test]
    fn test_division_emits_zero_guard() {
        let code = compile(&wrap("var x\nx = 10 / 4"));
        check_labels(&code);
        assert!(code.contains("DIVS"));
        assert!(code.contains("PUSHS float@0x0p+0"));
        assert!(code.contains("PUSHS nil@nil"));
    }

    #[test]
    fn test_relational_lowering() {
        let code = compile(&wrap("var x\nx = 1\nvar y\ny = x <= 2"));
        check_labels(&code);
        assert!(code.contains("GTS\nNOTS"));
    }
}
