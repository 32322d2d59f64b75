//! The two-pass semantic analyzer.

use ifjc_par::ast::{Block, Def, FuncCall, FuncDef, GetterDef, LocalDecl, Program, Rhs, SetterDef, Stmt};
use ifjc_util::{CompileError, DataType, Result, ScopeId};

use crate::scope::ScopeTree;
use crate::symbol::{builtins, func_key, getter_key, setter_key, FuncSymbol, SetterSymbol, Symbol, VarSymbol};

/// Everything the emitter needs from analysis: the scope tree (the AST is
/// annotated in place) and the global scope id.
pub struct Analysis {
    pub scopes: ScopeTree,
    pub global: ScopeId,
}

impl Analysis {
    /// Frame-name depth suffix for a variable declared in `scope`.
    pub fn depth(&self, scope: ScopeId) -> u32 {
        self.scopes.depth(scope)
    }
}

/// The semantic analyzer. Create one per compilation; built-ins are
/// preloaded into the global scope on construction.
pub struct SemanticAnalyzer {
    pub(crate) scopes: ScopeTree,
    pub(crate) global: ScopeId,
    main_defined: bool,
    /// Variables declared in the definition currently being walked.
    locals: Vec<LocalDecl>,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        let (mut scopes, global) = ScopeTree::new();
        for (key, params, return_type) in builtins() {
            let params = params
                .into_iter()
                .map(|(name, ty)| (name.to_string(), ty))
                .collect();
            scopes.insert(
                global,
                key,
                Symbol::Func(FuncSymbol {
                    params,
                    defined: true,
                    return_type,
                }),
            );
        }
        Self {
            scopes,
            global,
            main_defined: false,
            locals: Vec::new(),
        }
    }

    /// Runs both passes over `program`, annotating it in place.
    pub fn analyze(mut self, program: &mut Program) -> Result<Analysis> {
        self.register_definitions(program)?;

        for def in &mut program.defs {
            self.visit_def(def)?;
        }

        if !self.main_defined {
            return Err(CompileError::Undefined(
                "the program must define 'main' with 0 parameters".into(),
            ));
        }

        Ok(Analysis {
            scopes: self.scopes,
            global: self.global,
        })
    }

    // ------------------------------------------------------------------
    // Pass 1 - definitions
    // ------------------------------------------------------------------

    /// Registers every definition in the global scope. `main` with arity 0
    /// is retagged to [`Def::Main`] here; the retag is a node replacement,
    /// so the definition list is rebuilt.
    fn register_definitions(&mut self, program: &mut Program) -> Result<()> {
        let defs = std::mem::take(&mut program.defs);
        let mut registered = Vec::with_capacity(defs.len());

        for mut def in defs {
            let retag = match &mut def {
                Def::Function(f) => self.register_function(f)?,
                Def::Main(f) => {
                    self.register_function(f)?;
                    false
                }
                Def::Getter(g) => {
                    self.register_getter(g)?;
                    false
                }
                Def::Setter(s) => {
                    self.register_setter(s)?;
                    false
                }
            };
            if retag {
                match def {
                    Def::Function(f) => registered.push(Def::Main(f)),
                    _ => {
                        return Err(CompileError::Internal(
                            "retag requested for a non-function definition".into(),
                        ))
                    }
                }
            } else {
                registered.push(def);
            }
        }

        program.defs = registered;
        Ok(())
    }

    fn check_duplicate_params(&self, f: &FuncDef) -> Result<()> {
        for i in 1..f.params.len() {
            for j in 0..i {
                if f.params[i].name == f.params[j].name {
                    return Err(CompileError::Redefinition(format!(
                        "duplicate parameter '{}' in function '{}'",
                        f.params[i].name, f.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Registers a function, returning whether it is `main` with arity 0.
    fn register_function(&mut self, f: &mut FuncDef) -> Result<bool> {
        self.check_duplicate_params(f)?;

        let arity = f.params.len();
        let key = func_key(&f.name, arity);
        if matches!(
            self.scopes.lookup(self.global, &key),
            Some((_, Symbol::Func(_)))
        ) {
            return Err(CompileError::Redefinition(format!(
                "function '{}' with {arity} parameter(s)",
                f.name
            )));
        }

        let params = f.params.iter().map(|p| (p.name.clone(), p.ty)).collect();
        self.scopes.insert(
            self.global,
            key.clone(),
            Symbol::Func(FuncSymbol {
                params,
                defined: true,
                return_type: DataType::Undef,
            }),
        );

        let is_main = f.name == "main" && arity == 0;
        if is_main {
            self.main_defined = true;
        }

        // Rewrite the AST name to the overload key so the emitter can key
        // generated labels directly.
        f.name = key;

        let fscope = self.scopes.new_child(self.global);
        for p in &mut f.params {
            self.scopes.insert(
                fscope,
                p.name.clone(),
                Symbol::Var(VarSymbol {
                    ty: p.ty,
                    defined: true,
                    initialized: true,
                    scope: fscope,
                }),
            );
            p.scope = Some(fscope);
        }
        f.body.scope = Some(fscope);

        Ok(is_main)
    }

    fn register_getter(&mut self, g: &mut GetterDef) -> Result<()> {
        let key = getter_key(&g.name);
        if matches!(
            self.scopes.lookup_local(self.global, &key),
            Some(Symbol::Getter(_))
        ) {
            return Err(CompileError::Redefinition(format!("getter '{}'", g.name)));
        }
        self.scopes.insert(
            self.global,
            key.clone(),
            Symbol::Getter(crate::symbol::GetterSymbol {
                return_type: DataType::Undef,
                defined: true,
            }),
        );

        let gscope = self.scopes.new_child(self.global);
        g.body.scope = Some(gscope);

        // Adopt the first inferable return type so later statements that
        // reference the getter already see it. Statements whose type cannot
        // be inferred yet are skipped, not errors.
        if let Some(found) = self.scan_return_type(&mut g.body.stmts, gscope) {
            if let Some(Symbol::Getter(sym)) = self.scopes.lookup_mut(self.global, &key) {
                sym.return_type = found;
            }
        }
        Ok(())
    }

    fn register_setter(&mut self, s: &mut SetterDef) -> Result<()> {
        let key = setter_key(&s.name);
        if matches!(
            self.scopes.lookup_local(self.global, &key),
            Some(Symbol::Setter(_))
        ) {
            return Err(CompileError::Redefinition(format!("setter '{}'", s.name)));
        }
        self.scopes.insert(
            self.global,
            key,
            Symbol::Setter(SetterSymbol {
                param_type: s.param.ty,
                defined: true,
            }),
        );

        let sscope = self.scopes.new_child(self.global);
        self.scopes.insert(
            sscope,
            s.param.name.clone(),
            Symbol::Var(VarSymbol {
                ty: s.param.ty,
                defined: true,
                initialized: true,
                scope: sscope,
            }),
        );
        s.param.scope = Some(sscope);
        s.body.scope = Some(sscope);
        Ok(())
    }

    /// Pre-order scan of a body for the first `return` whose value type is
    /// already inferable. Inference failures are ignored here; pass 2 will
    /// report them in context.
    fn scan_return_type(&mut self, stmts: &mut [Stmt], scope: ScopeId) -> Option<DataType> {
        for stmt in stmts {
            match stmt {
                Stmt::Return {
                    value: Some(rhs), ..
                } => {
                    let found = match rhs {
                        Rhs::Expr(e) => self.infer_expr(e, scope).ok(),
                        Rhs::Call(c) => self.visit_call(c, scope).ok(),
                    };
                    if let Some(t) = found {
                        if t != DataType::Undef {
                            return Some(t);
                        }
                    }
                }
                Stmt::If {
                    then_block,
                    else_block,
                    ..
                } => {
                    if let Some(t) = self.scan_return_type(&mut then_block.stmts, scope) {
                        return Some(t);
                    }
                    if let Some(t) = self.scan_return_type(&mut else_block.stmts, scope) {
                        return Some(t);
                    }
                }
                Stmt::While { body, .. } => {
                    if let Some(t) = self.scan_return_type(&mut body.stmts, scope) {
                        return Some(t);
                    }
                }
                Stmt::Block(b) => {
                    if let Some(t) = self.scan_return_type(&mut b.stmts, scope) {
                        return Some(t);
                    }
                }
                _ => {}
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // Pass 2 - full walk
    // ------------------------------------------------------------------

    fn visit_def(&mut self, def: &mut Def) -> Result<()> {
        self.locals.clear();
        match def {
            Def::Main(f) | Def::Function(f) => {
                self.visit_block(&mut f.body, self.global)?;
                f.locals = std::mem::take(&mut self.locals);
            }
            Def::Getter(g) => {
                self.visit_block(&mut g.body, self.global)?;
                g.locals = std::mem::take(&mut self.locals);
            }
            Def::Setter(s) => {
                self.visit_block(&mut s.body, self.global)?;
                s.locals = std::mem::take(&mut self.locals);
            }
        }
        Ok(())
    }

    /// Visits a block. Function bodies already carry the scope bound in
    /// pass 1; nested blocks get a fresh child scope here.
    fn visit_block(&mut self, block: &mut Block, inherited: ScopeId) -> Result<()> {
        let scope = match block.scope {
            Some(s) => s,
            None => {
                let s = self.scopes.new_child(inherited);
                block.scope = Some(s);
                s
            }
        };
        for stmt in &mut block.stmts {
            self.visit_stmt(stmt, scope)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt, scope: ScopeId) -> Result<()> {
        match stmt {
            Stmt::VarDecl { name, scope: decl } => {
                if self.scopes.lookup_local(scope, name).is_some() {
                    return Err(CompileError::Redefinition(format!("symbol '{name}'")));
                }
                self.scopes.insert(
                    scope,
                    name.clone(),
                    Symbol::Var(VarSymbol {
                        ty: DataType::Undef,
                        defined: true,
                        initialized: false,
                        scope,
                    }),
                );
                *decl = Some(scope);
                self.locals.push(LocalDecl {
                    name: name.clone(),
                    scope,
                });
                Ok(())
            }

            Stmt::Assign { .. } => self.visit_assign(stmt, scope),

            Stmt::SetterCall { name, arg } => {
                let name = name.clone();
                self.check_setter_call(&name, arg, scope)
            }

            Stmt::Call(call) => {
                self.visit_call(call, scope)?;
                Ok(())
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond_ty = self.visit_rhs(cond, scope)?;
                if cond_ty != DataType::Num && cond_ty != DataType::Undef {
                    return Err(CompileError::TypeCompat(format!(
                        "if condition must be numeric, got {cond_ty}"
                    )));
                }
                self.visit_block(then_block, scope)?;
                self.visit_block(else_block, scope)
            }

            Stmt::While { cond, body } => {
                let cond_ty = self.visit_rhs(cond, scope)?;
                if cond_ty != DataType::Num && cond_ty != DataType::Undef {
                    return Err(CompileError::TypeCompat(format!(
                        "while condition must be numeric, got {cond_ty}"
                    )));
                }
                self.visit_block(body, scope)
            }

            Stmt::Return { value, ty } => {
                *ty = match value {
                    Some(rhs) => self.visit_rhs(rhs, scope)?,
                    // A void return yields null.
                    None => DataType::Null,
                };
                Ok(())
            }

            Stmt::Block(block) => self.visit_block(block, scope),
        }
    }

    /// Assignment: either an ordinary variable store, or - when the target
    /// name resolves to a setter - a rewrite of the whole statement into a
    /// [`Stmt::SetterCall`].
    fn visit_assign(&mut self, stmt: &mut Stmt, scope: ScopeId) -> Result<()> {
        let Stmt::Assign {
            target,
            scope: tscope,
            rhs,
        } = stmt
        else {
            return Err(CompileError::Internal("visit_assign on a non-assign".into()));
        };

        let skey = setter_key(target);
        let is_setter = matches!(
            self.scopes.lookup(scope, &skey),
            Some((_, Symbol::Setter(_)))
        );
        if is_setter {
            let name = std::mem::take(target);
            let mut arg = std::mem::replace(rhs, Rhs::Expr(ifjc_par::Expr::Null));
            self.check_setter_call(&name, &mut arg, scope)?;
            *stmt = Stmt::SetterCall { name, arg };
            return Ok(());
        }

        // Plain variable target; globals are lazily declared on first use.
        let known = match self.scopes.lookup(scope, target.as_str()) {
            Some((_, Symbol::Var(_))) => Some(true),
            Some(_) => Some(false),
            None => None,
        };
        match known {
            Some(true) => {}
            Some(false) => {
                return Err(CompileError::Semantic(format!(
                    "'{target}' is not a variable"
                )));
            }
            None if target.starts_with("__") => {
                let global = self.global;
                self.scopes.insert(
                    global,
                    target.clone(),
                    Symbol::Var(VarSymbol {
                        ty: DataType::Undef,
                        defined: true,
                        initialized: false,
                        scope: global,
                    }),
                );
            }
            None => {
                return Err(CompileError::Undefined(format!(
                    "variable '{target}' in assignment"
                )));
            }
        }

        let rhs_ty = self.visit_rhs(rhs, scope)?;

        let Some(Symbol::Var(var)) = self.scopes.lookup_mut(scope, target) else {
            return Err(CompileError::Internal(format!(
                "assignment target '{target}' vanished"
            )));
        };
        // Dynamic typing: the last assigned type wins whenever it is known.
        if rhs_ty != DataType::Undef {
            var.ty = rhs_ty;
        }
        var.initialized = true;
        *tscope = Some(var.scope);
        Ok(())
    }

    /// Shared checking for explicit and rewritten setter calls: argument
    /// type against the declared parameter type, with `Undef` and `Null`
    /// as wildcards, refining an `Undef` parameter on first call.
    fn check_setter_call(&mut self, name: &str, arg: &mut Rhs, scope: ScopeId) -> Result<()> {
        let skey = setter_key(name);
        let declared = match self.scopes.lookup(scope, &skey) {
            Some((_, Symbol::Setter(s))) => s.param_type,
            Some(_) => {
                return Err(CompileError::Semantic(format!("'{name}' is not a setter")));
            }
            None => {
                return Err(CompileError::Undefined(format!("setter '{name}'")));
            }
        };

        let arg_ty = self.visit_rhs(arg, scope)?;

        if declared != DataType::Undef
            && declared != DataType::Null
            && arg_ty != DataType::Undef
            && arg_ty != declared
        {
            return Err(CompileError::TypeCompat(format!(
                "setter '{name}' expects {declared}, got {arg_ty}"
            )));
        }
        if declared == DataType::Undef && arg_ty != DataType::Undef {
            if let Some(Symbol::Setter(s)) = self.scopes.lookup_mut(scope, &skey) {
                s.param_type = arg_ty;
            }
        }
        Ok(())
    }

    pub(crate) fn visit_rhs(&mut self, rhs: &mut Rhs, scope: ScopeId) -> Result<DataType> {
        match rhs {
            Rhs::Expr(e) => self.infer_expr(e, scope),
            Rhs::Call(c) => self.visit_call(c, scope),
        }
    }

    /// Checks a call, rewrites its name to the overload key, and records
    /// its result type. A missing overload with some other arity present
    /// is a wrong-parameter-count error, not an undefined symbol.
    pub(crate) fn visit_call(&mut self, call: &mut FuncCall, scope: ScopeId) -> Result<DataType> {
        // Identifiers cannot contain '$', so a '$' means the name has
        // already been overload-encoded (the getter scan may visit a call
        // before the main walk does).
        let (base, key) = match call.name.split_once('$') {
            Some((base, _)) => (base.to_string(), call.name.clone()),
            None => {
                let key = func_key(&call.name, call.args.len());
                (std::mem::replace(&mut call.name, key.clone()), key)
            }
        };

        let signature = match self.scopes.lookup(scope, &key) {
            Some((_, Symbol::Func(f))) => Some((f.params.clone(), f.return_type)),
            Some(_) => {
                return Err(CompileError::Semantic(format!("'{base}' is not a function")));
            }
            None => None,
        };

        let Some((params, return_type)) = signature else {
            if self.scopes.any_arity_exists(scope, &base) {
                return Err(CompileError::WrongParams(format!(
                    "function '{base}' called with {} argument(s)",
                    call.args.len()
                )));
            }
            return Err(CompileError::Undefined(format!(
                "function '{base}' with {} argument(s)",
                call.args.len()
            )));
        };

        for (arg, (pname, pty)) in call.args.iter_mut().zip(params.iter()) {
            let arg_ty = self.infer_expr(arg, scope)?;
            // Undef on either side defers the check to run time.
            if *pty != DataType::Undef && arg_ty != DataType::Undef && arg_ty != *pty {
                return Err(CompileError::WrongParams(format!(
                    "argument '{pname}' of '{base}' expects {pty}, got {arg_ty}"
                )));
            }
        }

        call.result = return_type;
        Ok(return_type)
    }
}
