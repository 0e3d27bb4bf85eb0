//! Renders an AST back to Lox source. The output re-parses to a tree of
//! the same shape: explicit parentheses only come from `Grouping` nodes,
//! and everything else falls out of the grammar's own precedence.

use crate::expr::{Expr, Stmt};
use crate::scanner::{Literal, Token};

pub fn print_program(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_stmt(statement: &Stmt) -> String {
    match statement {
        Stmt::Expression(expr) => format!("{};", print_expr(expr)),
        Stmt::Print(expr) => format!("print {};", print_expr(expr)),
        Stmt::Var { name, initializer } => match initializer {
            Some(init) => format!("var {} = {};", name.lexeme, print_expr(init)),
            None => format!("var {};", name.lexeme),
        },
        Stmt::Block { statements } => format!("{{ {} }}", print_statements(statements)),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            let mut text = format!(
                "if ({}) {}",
                print_expr(condition),
                print_stmt(then_branch)
            );
            if let Some(else_branch) = else_branch {
                text.push_str(&format!(" else {}", print_stmt(else_branch)));
            }
            text
        }
        Stmt::While { condition, body } => {
            format!("while ({}) {}", print_expr(condition), print_stmt(body))
        }
        Stmt::Function { name, params, body } => {
            format!("fun {}", function_text(&name.lexeme, params, body))
        }
        Stmt::Return { value, .. } => match value {
            Some(value) => format!("return {};", print_expr(value)),
            None => "return;".to_string(),
        },
        Stmt::Class {
            name,
            superclass,
            methods,
        } => {
            let mut text = format!("class {}", name.lexeme);
            if let Some(Expr::Variable {
                name: superclass, ..
            }) = superclass
            {
                text.push_str(&format!(" < {}", superclass.lexeme));
            }
            let methods = methods
                .iter()
                .map(|method| match method {
                    Stmt::Function { name, params, body } => {
                        function_text(&name.lexeme, params, body)
                    }
                    other => print_stmt(other),
                })
                .collect::<Vec<_>>()
                .join(" ");
            text.push_str(&format!(" {{ {} }}", methods));
            text
        }
    }
}

pub fn print_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => match literal {
            Literal::Nil => "nil".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Number(n) => n.to_string(),
            Literal::String(s) => format!("\"{}\"", s),
        },
        Expr::Grouping(inner) => format!("({})", print_expr(inner)),
        Expr::Unary { operator, right } => format!("{}{}", operator.lexeme, print_expr(right)),
        Expr::Binary {
            left,
            operator,
            right,
        }
        | Expr::Logical {
            left,
            operator,
            right,
        } => format!(
            "{} {} {}",
            print_expr(left),
            operator.lexeme,
            print_expr(right)
        ),
        Expr::Variable { name, .. } => name.lexeme.clone(),
        Expr::Assign { name, value, .. } => {
            format!("{} = {}", name.lexeme, print_expr(value))
        }
        Expr::Call { callee, args, .. } => {
            let args = args
                .iter()
                .map(print_expr)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", print_expr(callee), args)
        }
        Expr::Get { object, name } => format!("{}.{}", print_expr(object), name.lexeme),
        Expr::Set {
            object,
            name,
            value,
        } => format!(
            "{}.{} = {}",
            print_expr(object),
            name.lexeme,
            print_expr(value)
        ),
        Expr::This { .. } => "this".to_string(),
        Expr::Super { method, .. } => format!("super.{}", method.lexeme),
    }
}

fn print_statements(statements: &[Stmt]) -> String {
    statements
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join(" ")
}

fn function_text(name: &str, params: &[Token], body: &[Stmt]) -> String {
    let params = params
        .iter()
        .map(|p| p.lexeme.clone())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({}) {{ {} }}", name, params, print_statements(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> Vec<Stmt> {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let mut next_id = 0;
        let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
        assert!(
            !reporter.had_error(),
            "parse errors in test source: {:?}",
            reporter.errors()
        );
        statements
    }

    #[test]
    fn prints_expressions_with_grouping_parens_only() {
        let program = parse("print (1 + 2) * -3;");
        assert_eq!(print_program(&program), "print (1 + 2) * -3;");
    }

    #[test]
    fn prints_class_with_superclass_and_methods() {
        let source = "class B < A { m() { return super.m() + \"B\"; } }";
        let program = parse(source);
        assert_eq!(
            print_program(&program),
            "class B < A { m() { return super.m() + \"B\"; } }"
        );
    }

    #[test]
    fn reprinting_is_a_fixed_point() {
        let sources = [
            "var x = 10; { var x = 20; print x; } print x;",
            "fun add(a, b) { return a + b; } print add(1, 2);",
            "if (a and b or c) print \"yes\"; else print \"no\";",
            "while (i < 3) { i = i + 1; o.field = o.field + 1; print o.m(i); }",
        ];
        for source in sources {
            let once = print_program(&parse(source));
            let twice = print_program(&parse(&once));
            assert_eq!(once, twice, "printing is not stable for: {}", source);
        }
    }
}
