use rustc_hash::FxHashMap;

use crate::error::{ErrorReporter, LoxError};
use crate::expr::{Expr, Stmt};
use crate::interpreter::Interpreter;
use crate::scanner::Token;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Static pass between parsing and execution. Walks the AST with a
/// stack of scopes (name -> fully-defined?), records the lexical depth
/// of every `Variable`/`Assign`/`this`/`super` use in the interpreter's
/// side table, and reports scope-sensitive errors. The global scope is
/// implicit: an empty stack means every lookup falls through to the
/// globals at runtime.
pub struct Resolver<'a, 'w> {
    interpreter: &'a mut Interpreter<'w>,
    reporter: &'a mut ErrorReporter,
    scopes: Vec<FxHashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'w> Resolver<'a, 'w> {
    pub fn new(interpreter: &'a mut Interpreter<'w>, reporter: &'a mut ErrorReporter) -> Self {
        Self {
            interpreter,
            reporter,
            scopes: vec![],
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    pub fn resolve_statements(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    fn resolve_statement(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Block { statements } => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Function { name, params, body } => {
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body, FunctionType::Function);
            }
            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_statement(body);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter
                        .report(LoxError::resolve(keyword, "Can't return from top-level code."));
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter.report(LoxError::resolve(
                            keyword,
                            "Can't return a value from an initializer.",
                        ));
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if let Expr::Variable {
                        name: superclass_name,
                        ..
                    } = superclass
                    {
                        if superclass_name.lexeme == name.lexeme {
                            self.reporter.report(LoxError::resolve(
                                superclass_name,
                                "A class can't inherit from itself.",
                            ));
                        }
                    }
                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);
                    self.begin_scope();
                    self.scope_insert("super");
                }

                self.begin_scope();
                self.scope_insert("this");

                for method in methods {
                    if let Stmt::Function {
                        name: method_name,
                        params,
                        body,
                    } = method
                    {
                        let function_type = if method_name.lexeme == "init" {
                            FunctionType::Initializer
                        } else {
                            FunctionType::Method
                        };
                        self.resolve_function(params, body, function_type);
                    }
                }

                self.end_scope();
                if superclass.is_some() {
                    self.end_scope();
                }
                self.current_class = enclosing_class;
            }
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary { right, .. } => self.resolve_expr(right),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Variable { name, id } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.reporter.report(LoxError::resolve(
                            name,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Assign { name, value, id } => {
                self.resolve_expr(value);
                self.resolve_local(*id, &name.lexeme);
            }
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => {
                // Property names are looked up dynamically; only the
                // object expression resolves statically.
                self.resolve_expr(object);
            }
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { keyword, id } => {
                if self.current_class == ClassType::None {
                    self.reporter.report(LoxError::resolve(
                        keyword,
                        "Can't use 'this' outside of a class.",
                    ));
                    return;
                }
                self.resolve_local(*id, &keyword.lexeme);
            }
            Expr::Super { keyword, id, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.reporter.report(LoxError::resolve(
                            keyword,
                            "Can't use 'super' outside of a class.",
                        ));
                    }
                    ClassType::Class => {
                        self.reporter.report(LoxError::resolve(
                            keyword,
                            "Can't use 'super' in a class with no superclass.",
                        ));
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, &keyword.lexeme);
            }
        }
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], function_type: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = function_type;
        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_statements(body);
        self.end_scope();
        self.current_function = enclosing;
    }

    /// Marks a name as declared but not yet usable, so its own
    /// initializer cannot read it. Re-declaring in the same local scope
    /// is an error; the globals may be re-declared freely.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.report(LoxError::resolve(
                    name,
                    "Already a variable with this name in this scope.",
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Finds the innermost scope containing `name` and records its
    /// depth. No hit means the use is (assumed) global and nothing is
    /// recorded.
    fn resolve_local(&mut self, id: usize, name: &str) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn scope_insert(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    /// Resolves a source unit, returning the diagnostics and the
    /// depth table sorted by expression id.
    fn resolve_source(source: &str) -> (Vec<String>, Vec<(usize, usize)>) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let mut next_id = 0;
        let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
        assert!(
            !reporter.had_error(),
            "test source must parse: {:?}",
            reporter.errors()
        );
        let mut sink: Vec<u8> = Vec::new();
        let mut interpreter = Interpreter::new(&mut sink);
        Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
        let mut table: Vec<(usize, usize)> = interpreter
            .locals()
            .iter()
            .map(|(id, depth)| (*id, *depth))
            .collect();
        table.sort_unstable();
        let errors = reporter.take().into_iter().map(|e| e.to_string()).collect();
        (errors, table)
    }

    #[test]
    fn records_depth_as_hops_from_the_use_site() {
        // id 0 is the read of `a` in the same scope, depth 0.
        let (errors, table) = resolve_source("{ var a = 1; print a; }");
        assert!(errors.is_empty());
        assert_eq!(table, vec![(0, 0)]);

        // One block deeper: same read now sits one hop away.
        let (errors, table) = resolve_source("{ var a = 1; { print a; } }");
        assert!(errors.is_empty());
        assert_eq!(table, vec![(0, 1)]);
    }

    #[test]
    fn global_uses_are_absent_from_the_table() {
        let (errors, table) = resolve_source("var a = 1; print a;");
        assert!(errors.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn params_resolve_inside_the_function_scope() {
        let (errors, table) = resolve_source("fun f(x) { return x; }");
        assert!(errors.is_empty());
        assert_eq!(table, vec![(0, 0)]);
    }

    #[test]
    fn own_initializer_read_is_rejected_in_locals_only() {
        let (errors, _) = resolve_source("{ var x = x; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't read local variable in its own initializer."));

        let (errors, _) = resolve_source("var x = x;");
        assert!(errors.is_empty(), "globals defer to the runtime: {:?}", errors);
    }

    #[test]
    fn shadowing_in_an_inner_scope_is_fine() {
        let (errors, table) = resolve_source("{ var a = 1; { var a = 2; print a; } }");
        assert!(errors.is_empty());
        // The print sees the inner `a`.
        assert_eq!(table, vec![(0, 0)]);
    }

    #[test]
    fn this_and_super_get_their_synthetic_scopes() {
        let source = "class A { m() { return 1; } } \
                      class B < A { m() { return super.m() + this.extra; } }";
        let (errors, table) = resolve_source(source);
        assert!(errors.is_empty());
        // Ids in parse order: A (superclass use), super, this; both
        // keywords sit under the method's param scope, with `this` one
        // scope in and `super` one further out.
        assert_eq!(table, vec![(1, 2), (2, 1)]);
    }
}

