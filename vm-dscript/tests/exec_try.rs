mod common;

use common::*;

#[test]
fn try_catch_binds_param_and_returns_value() {
  assert_eq!(
    run_ok(r#"try { throw 'x'; } catch (e) { e }"#),
    Lit::Str("x".to_string())
  );
}

#[test]
fn try_finally_rethrows_when_finally_completes_normally() {
  // `try { throw 1 } finally {}` must re-throw 1 after the finally body.
  assert_eq!(run_uncaught("try { throw 1; } finally {}"), Lit::Num(1.0));
}

#[test]
fn finally_return_suppresses_the_throw() {
  // An abrupt finally completion overrides the saved one entirely.
  assert_eq!(
    run_ok("function f() { try { throw 1; } finally { return 2; } } f()"),
    Lit::Num(2.0)
  );
}

#[test]
fn finally_throw_overrides_the_original_throw() {
  assert_eq!(
    run_uncaught("try { throw 'original'; } finally { throw 'override'; }"),
    Lit::Str("override".to_string())
  );
}

#[test]
fn catch_rethrow_propagates() {
  assert_eq!(
    run_uncaught(r#"try { throw 'x'; } catch (e) { throw 'y'; }"#),
    Lit::Str("y".to_string())
  );
}

#[test]
fn finally_runs_exactly_once_per_path() {
  // Normal completion.
  assert_eq!(
    run_ok("var fin = 0; try { 1; } finally { fin = fin + 1; } fin"),
    Lit::Num(1.0)
  );
  // Return path.
  assert_eq!(
    run_ok(
      r#"
        var fin = 0;
        function f() { try { return 'r'; } finally { fin = fin + 1; } }
        f();
        fin
      "#,
    ),
    Lit::Num(1.0)
  );
  // Throw-then-catch path.
  assert_eq!(
    run_ok(
      r#"
        var fin = 0;
        try {
          try { throw 1; } finally { fin = fin + 1; }
        } catch (e) {}
        fin
      "#,
    ),
    Lit::Num(1.0)
  );
  // Break path.
  assert_eq!(
    run_ok("var fin = 0; while (true) { try { break; } finally { fin = fin + 1; } } fin"),
    Lit::Num(1.0)
  );
}

#[test]
fn finally_preserves_saved_break_and_return() {
  assert_eq!(
    run_ok(
      r#"
        var n = 0;
        while (true) {
          n = n + 1;
          try { break; } finally { n = n + 10; }
        }
        n
      "#,
    ),
    Lit::Num(11.0)
  );
  assert_eq!(
    run_ok("function f() { try { return 1; } finally {} } f()"),
    Lit::Num(1.0)
  );
}

#[test]
fn finally_break_overrides_saved_continue() {
  assert_eq!(
    run_ok(
      r#"
        var iterations = 0;
        while (true) {
          iterations = iterations + 1;
          try { continue; } finally { break; }
        }
        iterations
      "#,
    ),
    Lit::Num(1.0)
  );
}

#[test]
fn try_statement_completion_value_is_update_empty_with_undefined() {
  assert_eq!(run_ok("1; try {} finally {}"), Lit::Undefined);
  assert_eq!(run_ok("1; try {} catch (e) {}"), Lit::Undefined);
  assert_eq!(run_ok("try { 1 } finally {}"), Lit::Num(1.0));
  assert_eq!(
    run_ok("while (true) { 1; try { break; } finally {} }"),
    Lit::Undefined
  );
}

#[test]
fn catch_scope_is_a_child_context() {
  // The catch binding shadows outer names and disappears afterwards.
  assert_eq!(
    run_ok(
      r#"
        var e = 'outer';
        try { throw 'inner'; } catch (e) {}
        e
      "#,
    ),
    Lit::Str("outer".to_string())
  );
  assert_eq!(
    run_ok("try { throw 1; } catch (e) {} typeof e"),
    Lit::Str("undefined".to_string())
  );
}

#[test]
fn var_declared_in_catch_hoists_to_the_function_scope() {
  assert_eq!(
    run_ok("var e = 1; try { throw 2; } catch (e) { var f = 3; } f"),
    Lit::Num(3.0)
  );
}

#[test]
fn nested_try_finally_order() {
  assert_eq!(
    run_ok(
      r#"
        var order = '';
        try {
          try {
            throw 'x';
          } finally {
            order = order + '1';
          }
        } catch (e) {
          order = order + '2';
        } finally {
          order = order + '3';
        }
        order
      "#,
    ),
    Lit::Str("123".to_string())
  );
}

#[test]
fn throw_of_non_error_values() {
  assert_eq!(run_uncaught("throw 42;"), Lit::Num(42.0));
  assert_eq!(run_uncaught("throw null;"), Lit::Null);
  assert_eq!(
    run_ok("try { throw [1, 2]; } catch (e) { e.length }"),
    Lit::Num(2.0)
  );
}

#[test]
fn runtime_faults_are_catchable_error_objects() {
  assert_eq!(
    run_ok("var r; try { missing(); } catch (e) { r = e.name; } r"),
    Lit::Str("ReferenceError".to_string())
  );
  assert_eq!(
    run_ok("var r; try { (0)(); } catch (e) { r = e.name; } r"),
    Lit::Str("TypeError".to_string())
  );
  assert_eq!(
    run_ok("var r; try { null.x; } catch (e) { r = e.message; } r"),
    Lit::Str("cannot read properties of null (reading 'x')".to_string())
  );
}
