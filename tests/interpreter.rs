use loxwalk::error::ErrorReporter;
use loxwalk::interpreter::Interpreter;
use loxwalk::parser::Parser;
use loxwalk::resolver::Resolver;
use loxwalk::scanner::Scanner;
use loxwalk::{Lox, RunStatus};

/// Runs a whole program through the public pipeline, capturing stdout.
fn run(source: &str) -> (String, RunStatus) {
    let mut out: Vec<u8> = Vec::new();
    let status = {
        let mut lox = Lox::new(&mut out);
        lox.run(source, false)
    };
    (String::from_utf8(out).expect("print output is UTF-8"), status)
}

fn run_ok(source: &str) -> String {
    let (out, status) = run(source);
    assert_eq!(status, RunStatus::Ok, "program did not run cleanly: {}", source);
    out
}

/// Drives the phases by hand so the runtime error itself is observable.
fn runtime_error(source: &str) -> String {
    let mut reporter = ErrorReporter::new();
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let mut next_id = 0;
    let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
    let mut sink: Vec<u8> = Vec::new();
    let mut interpreter = Interpreter::new(&mut sink);
    Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    assert!(
        !reporter.had_error(),
        "expected a clean front end for {:?}, got {:?}",
        source,
        reporter.errors()
    );
    interpreter
        .interpret(&statements)
        .expect_err("expected a runtime error")
        .to_string()
}

/// Collects scan/parse/resolve diagnostics for a source unit.
fn static_errors(source: &str) -> Vec<String> {
    let mut reporter = ErrorReporter::new();
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let mut next_id = 0;
    let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
    if !reporter.had_error() {
        let mut sink: Vec<u8> = Vec::new();
        let mut interpreter = Interpreter::new(&mut sink);
        Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    }
    reporter.take().into_iter().map(|e| e.to_string()).collect()
}

#[test]
fn arithmetic_respects_precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
    assert_eq!(run_ok("print 10 - 4 - 3;"), "3\n");
    assert_eq!(run_ok("print -2 * -3;"), "6\n");
    assert_eq!(run_ok("print 1 - -1;"), "2\n");
}

#[test]
fn block_scopes_shadow_and_restore() {
    assert_eq!(
        run_ok("var x = 10; { var x = 20; print x; } print x;"),
        "20\n10\n"
    );
}

#[test]
fn closures_capture_per_call_environments() {
    let source = "fun makeCounter() { var c = 0; fun inc() { c = c + 1; return c; } return inc; } \
                  var a = makeCounter(); var b = makeCounter(); \
                  print a(); print a(); print b(); print a();";
    assert_eq!(run_ok(source), "1\n2\n1\n3\n");
}

#[test]
fn super_dispatches_past_the_overriding_class() {
    let source = "class A { m() { return \"A\"; } } \
                  class B < A { m() { return super.m() + \"B\"; } } \
                  print B().m();";
    assert_eq!(run_ok(source), "AB\n");
}

#[test]
fn super_skips_straight_to_the_chain_of_the_superclass() {
    let source = "class A { m() { return \"A\"; } } \
                  class B < A { } \
                  class C < B { m() { return super.m() + \"C\"; } } \
                  print C().m();";
    assert_eq!(run_ok(source), "AC\n");
}

#[test]
fn rebinding_init_returns_the_bound_instance() {
    let source = "class C { init(n) { this.n = n; } } \
                  var c = C(7); var f = c.init; print f(9).n;";
    assert_eq!(run_ok(source), "9\n");
}

#[test]
fn init_returns_this_even_on_bare_return() {
    let source = "class C { init() { return; } } print C();";
    assert_eq!(run_ok(source), "C instance\n");
}

#[test]
fn empty_program_is_silent() {
    let (out, status) = run("");
    assert_eq!(status, RunStatus::Ok);
    assert!(out.is_empty());
}

#[test]
fn strings_concatenate_and_mixed_plus_fails() {
    assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    assert_eq!(
        runtime_error("print \"foo\" + 1;"),
        "Operands must be two numbers or two strings.\n[line 1]"
    );
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(run_ok("print 1 / 0;"), "inf\n");
    assert_eq!(run_ok("print 0 / 0;"), "NaN\n");
    // NaN compares false against everything, itself included.
    assert_eq!(run_ok("print 0 / 0 == 0 / 0;"), "false\n");
    assert_eq!(run_ok("print 0 / 0 < 1;"), "false\n");
}

#[test]
fn logical_operators_return_operands_and_short_circuit() {
    assert_eq!(run_ok("print 1 or 2;"), "1\n");
    assert_eq!(run_ok("print nil or \"fallback\";"), "fallback\n");
    assert_eq!(run_ok("print nil and 3;"), "nil\n");
    assert_eq!(run_ok("print 1 and 2;"), "2\n");
    // The right side must not run when the left decides the answer.
    assert_eq!(
        run_ok("fun boom() { print \"boom\"; } false and boom(); print \"done\";"),
        "done\n"
    );
}

#[test]
fn zero_and_empty_string_are_truthy() {
    assert_eq!(run_ok("if (0) print \"t\"; else print \"f\";"), "t\n");
    assert_eq!(run_ok("if (\"\") print \"t\"; else print \"f\";"), "t\n");
    assert_eq!(run_ok("if (nil) print \"t\"; else print \"f\";"), "f\n");
}

#[test]
fn for_loop_desugars_to_while() {
    assert_eq!(
        run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
        "0\n1\n2\n"
    );
    // No condition means loop forever; prove it runs by breaking via return.
    let source = "fun first() { for (var i = 0;; i = i + 1) { if (i >= 2) return i; } } \
                  print first();";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn while_loop_runs_and_return_unwinds_nested_blocks() {
    let source = "fun find() { var i = 0; while (true) { i = i + 1; { if (i > 2) { return i; } } } } \
                  print find();";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run_ok("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn bound_methods_stay_attached_to_their_instance() {
    let source = "class Counter { init() { this.n = 0; } \
                    bump() { this.n = this.n + 1; return this.n; } } \
                  var c = Counter(); var f = c.bump; var g = c.bump; \
                  print f(); print g(); print c.bump();";
    assert_eq!(run_ok(source), "1\n2\n3\n");
}

#[test]
fn methods_resolve_up_the_inheritance_chain() {
    let source = "class A { hello() { return \"A\"; } shared() { return \"base\"; } } \
                  class B < A { hello() { return \"B\"; } } \
                  var b = B(); print b.hello(); print b.shared();";
    assert_eq!(run_ok(source), "B\nbase\n");
}

#[test]
fn fields_shadow_methods() {
    let source = "class Box { val() { return \"method\"; } } \
                  var box = Box(); print box.val(); box.val = 5; print box.val;";
    assert_eq!(run_ok(source), "method\n5\n");
}

#[test]
fn callables_and_instances_stringify_by_name() {
    let source = "fun f() {} class K {} print f; print K; print K(); print clock;";
    assert_eq!(run_ok(source), "<fn f>\nK\nK instance\n<fn clock>\n");
}

#[test]
fn clock_native_returns_a_positive_number() {
    assert_eq!(run_ok("print clock() > 0;"), "true\n");
}

#[test]
fn equality_mixes_types_to_false() {
    assert_eq!(run_ok("print nil == nil;"), "true\n");
    assert_eq!(run_ok("print nil == false;"), "false\n");
    assert_eq!(run_ok("print 0 == \"0\";"), "false\n");
    assert_eq!(run_ok("print \"a\" == \"a\";"), "true\n");
    assert_eq!(run_ok("print 1 != 2;"), "true\n");
    // Instances compare by identity, not structure.
    let source = "class P {} var a = P(); var b = P(); print a == b; print a == a;";
    assert_eq!(run_ok(source), "false\ntrue\n");
}

#[test]
fn multi_line_strings_print_verbatim() {
    assert_eq!(run_ok("print \"line one\nline two\";"), "line one\nline two\n");
}

#[test]
fn runtime_error_messages_match_the_operator_contracts() {
    assert_eq!(
        runtime_error("print -\"s\";"),
        "Operand must be a number.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print \"a\" < \"b\";"),
        "Operands must be numbers.\n[line 1]"
    );
    assert_eq!(
        runtime_error("\"not callable\"();"),
        "Can only call functions and classes.\n[line 1]"
    );
    assert_eq!(
        runtime_error("fun f(a, b) {} f(1);"),
        "Expected 2 arguments but got 1.\n[line 1]"
    );
    assert_eq!(
        runtime_error("var s = \"x\"; print s.length;"),
        "Only instances have fields.\n[line 1]"
    );
    assert_eq!(
        runtime_error("true.field = 1;"),
        "Only instances have fields.\n[line 1]"
    );
    assert_eq!(
        runtime_error("class E {} print E().missing;"),
        "Undefined property 'missing'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("print nothing;"),
        "Undefined variable 'nothing'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("undeclared = 1;"),
        "Undefined variable 'undeclared'.\n[line 1]"
    );
    assert_eq!(
        runtime_error("var NotAClass = 1; class S < NotAClass {}"),
        "Superclass must be a class.\n[line 1]"
    );
}

#[test]
fn class_arity_comes_from_init() {
    assert_eq!(
        runtime_error("class C { init(n) {} } C();"),
        "Expected 1 arguments but got 0.\n[line 1]"
    );
    assert_eq!(run_ok("class D {} D(); print \"ok\";"), "ok\n");
}

#[test]
fn local_self_reference_is_a_resolve_error_but_global_is_runtime() {
    let errors = static_errors("{ var x = x; }");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Can't read local variable in its own initializer."));

    // At the top level the initializer is just an ordinary global read,
    // which fails at runtime when the name was never defined before.
    assert_eq!(
        runtime_error("var x = x;"),
        "Undefined variable 'x'.\n[line 1]"
    );
    // ...and succeeds when it was.
    assert_eq!(run_ok("var x = 1; var x = x + 1; print x;"), "2\n");
}

#[test]
fn resolver_rejects_misplaced_statements() {
    assert!(static_errors("return 1;")[0].contains("Can't return from top-level code."));
    assert!(static_errors("class C { init() { return 1; } }")[0]
        .contains("Can't return a value from an initializer."));
    assert!(static_errors("print this;")[0].contains("Can't use 'this' outside of a class."));
    assert!(static_errors("print super.m;")[0].contains("Can't use 'super' outside of a class."));
    assert!(static_errors("class C { m() { return super.m(); } }")[0]
        .contains("Can't use 'super' in a class with no superclass."));
    assert!(static_errors("class C < C {}")[0].contains("A class can't inherit from itself."));
    assert!(static_errors("{ var a = 1; var a = 2; }")[0]
        .contains("Already a variable with this name in this scope."));
}

#[test]
fn globals_may_be_redeclared() {
    assert!(static_errors("var a = 1; var a = 2;").is_empty());
    assert_eq!(run_ok("var a = 1; var a = 2; print a;"), "2\n");
}

#[test]
fn parse_errors_are_collected_with_recovery() {
    let errors = static_errors("var = 1; print 2;; var x = ;");
    assert!(errors.len() >= 2, "expected several errors, got {:?}", errors);
    for error in &errors {
        assert!(error.starts_with("[line 1] Error"), "got: {}", error);
    }
    // Nothing ran even though some statements were fine.
    let (out, status) = run("print 1; var = oops;");
    assert_eq!(status, RunStatus::StaticError);
    assert!(out.is_empty());
}

#[test]
fn invalid_assignment_target_is_reported() {
    let errors = static_errors("1 = 2;");
    assert!(errors[0].contains("Invalid assignment target."));
}

#[test]
fn argument_count_boundary_at_255() {
    let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
    let args = vec!["1"; 255];
    let source = format!(
        "fun f({}) {{ return p254; }} print f({});",
        params.join(", "),
        args.join(", ")
    );
    assert_eq!(run_ok(&source), "1\n");

    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun g({}) {{ return 0; }}", params.join(", "));
    let errors = static_errors(&source);
    assert!(errors
        .iter()
        .any(|e| e.contains("Can't have more than 255 parameters.")));

    let args = vec!["1"; 256];
    let source = format!("fun h(a) {{ return a; }} h({});", args.join(", "));
    let errors = static_errors(&source);
    assert!(errors
        .iter()
        .any(|e| e.contains("Can't have more than 255 arguments.")));
}

#[test]
fn environment_restores_after_a_runtime_error() {
    let mut sink: Vec<u8> = Vec::new();
    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new(&mut sink);
    let mut next_id = 0;

    let tokens = Scanner::new("var a = 1; { var a = 2; print missing; }").scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
    Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    assert!(!reporter.had_error());
    assert!(interpreter.interpret(&statements).is_err());

    // If the block scope leaked, this would define `d` in the dead
    // scope and the unresolved (global) read would then fail.
    let tokens = Scanner::new("var d = 5; print d; print a;").scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
    Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    assert!(!reporter.had_error());
    interpreter
        .interpret(&statements)
        .expect("interpreter should be usable after an error");

    drop(interpreter);
    assert_eq!(String::from_utf8(sink).unwrap(), "5\n1\n");
}

#[test]
fn resolving_twice_yields_the_same_table() {
    let mut sink: Vec<u8> = Vec::new();
    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new(&mut sink);
    let mut next_id = 0;

    let source = "{ var a = 1; { var b = a; fun f(x) { return x + a + b; } print f(2); } }";
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, false, &mut next_id, &mut reporter).parse();
    assert!(!reporter.had_error());

    Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    let mut first: Vec<(usize, usize)> =
        interpreter.locals().iter().map(|(k, v)| (*k, *v)).collect();
    first.sort_unstable();
    assert!(!first.is_empty());

    let mut reporter = ErrorReporter::new();
    Resolver::new(&mut interpreter, &mut reporter).resolve_statements(&statements);
    let mut second: Vec<(usize, usize)> =
        interpreter.locals().iter().map(|(k, v)| (*k, *v)).collect();
    second.sort_unstable();

    assert_eq!(first, second);
}

#[test]
fn repl_mode_prints_bare_expressions() {
    let mut out: Vec<u8> = Vec::new();
    {
        let mut lox = Lox::new(&mut out);
        assert_eq!(lox.run("var x = 21;", true), RunStatus::Ok);
        assert_eq!(lox.run("x * 2", true), RunStatus::Ok);
        // Errors leave the session usable.
        assert_eq!(lox.run("y", true), RunStatus::RuntimeError);
        assert_eq!(lox.run("x + 1", true), RunStatus::Ok);
    }
    assert_eq!(String::from_utf8(out).unwrap(), "42\n22\n");
}

#[test]
fn shared_upvalue_is_visible_to_sibling_closures() {
    let source = "fun pair() { var n = 0; fun set(v) { n = v; } fun get() { return n; } \
                    set(8); return get(); } \
                  print pair();";
    assert_eq!(run_ok(source), "8\n");
}

#[test]
fn set_evaluates_object_before_value() {
    // The object expression fails before the value runs; a side effect
    // in the value would otherwise be visible.
    let source = "fun boom() { print \"ran\"; return 1; } nothing.f = boom();";
    assert_eq!(
        runtime_error(source),
        "Undefined variable 'nothing'.\n[line 1]"
    );
}
