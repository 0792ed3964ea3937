mod common;

use common::*;

#[test]
fn final_expression_value_is_returned() {
  assert_eq!(run_ok("1 + 2"), Lit::Num(3.0));
  assert_eq!(run_ok("var x = 1; x = 2; x"), Lit::Num(2.0));
  assert_eq!(run_ok("'a' + 'b'"), Lit::Str("ab".to_string()));
}

#[test]
fn empty_program_is_undefined() {
  assert_eq!(run_ok(""), Lit::Undefined);
  assert_eq!(run_ok(";;"), Lit::Undefined);
}

#[test]
fn if_statement_keeps_prior_statement_value() {
  // An `if` whose taken branch produces no value leaves the running value
  // untouched.
  assert_eq!(run_ok("1; if (true) {}"), Lit::Num(1.0));
  assert_eq!(run_ok("1; if (false) {} "), Lit::Num(1.0));
  assert_eq!(run_ok("1; if (true) { 2; }"), Lit::Num(2.0));
}

#[test]
fn var_decl_and_if_statement_execute() {
  assert_eq!(
    run_ok("var x = 1; if (x === 1) { x = 2; } x"),
    Lit::Num(2.0)
  );
}

#[test]
fn let_and_const_are_block_scoped() {
  assert_eq!(
    run_ok("let x = 1; { let x = 2; } x"),
    Lit::Num(1.0)
  );
  assert_eq!(
    run_ok("var r; try { const c = 1; c = 2; } catch (e) { r = e.name; } r"),
    Lit::Str("TypeError".to_string())
  );
}

#[test]
fn var_hoists_to_function_scope() {
  assert_eq!(run_ok("{ var x = 1; } x"), Lit::Num(1.0));
  assert_eq!(run_ok("typeof later; var later = 1;"), Lit::Str("undefined".to_string()));
}

#[test]
fn unresolved_read_throws_reference_error() {
  let thrown = run_uncaught("missing;");
  assert!(matches!(thrown, Lit::Err(name, _) if name == "ReferenceError"));
}

#[test]
fn sloppy_assignment_creates_global_strict_assignment_throws() {
  assert_eq!(run_ok("made = 5; made"), Lit::Num(5.0));
  let thrown = run_uncaught("'use strict'; missing = 1;");
  assert!(matches!(thrown, Lit::Err(name, _) if name == "ReferenceError"));
}

#[test]
fn objects_and_arrays_evaluate() {
  assert_eq!(run_ok("var o = { a: 1, b: 2 }; o.a + o['b']"), Lit::Num(3.0));
  assert_eq!(run_ok("var a = [1, 2, 3]; a[0] + a.length"), Lit::Num(4.0));
  assert_eq!(run_ok("var a = [1]; a[3] = 9; a.length"), Lit::Num(4.0));
  assert_eq!(run_ok("var o = {}; o.x = 1; o.x"), Lit::Num(1.0));
}

#[test]
fn member_access_on_nullish_throws_type_error() {
  let thrown = run_uncaught("var o = null; o.x;");
  assert!(matches!(thrown, Lit::Err(name, _) if name == "TypeError"));
}

#[test]
fn invalid_assignment_target_faults_at_runtime() {
  let thrown = run_uncaught("1 = 2;");
  assert!(matches!(thrown, Lit::Err(name, _) if name == "ReferenceError"));
}

#[test]
fn compound_assignment_and_update_operators() {
  assert_eq!(run_ok("var x = 2; x += 3; x *= 2; x"), Lit::Num(10.0));
  assert_eq!(run_ok("var x = 1; var y = x++; y * 10 + x"), Lit::Num(12.0));
  assert_eq!(run_ok("var x = 1; var y = ++x; y * 10 + x"), Lit::Num(22.0));
}

#[test]
fn equality_operators() {
  assert_eq!(run_ok("1 == '1'"), Lit::Bool(true));
  assert_eq!(run_ok("1 === '1'"), Lit::Bool(false));
  assert_eq!(run_ok("var u; null == u"), Lit::Bool(true));
  assert_eq!(run_ok("null == 0"), Lit::Bool(false));
  // NaN compares unequal to itself under both equality forms.
  assert_eq!(run_ok("var n = 0 / 0; n == n"), Lit::Bool(false));
  assert_eq!(run_ok("var n = 0 / 0; n === n"), Lit::Bool(false));
}

#[test]
fn logical_operators_short_circuit() {
  assert_eq!(run_ok("var n = 0; false && (n = 1); n"), Lit::Num(0.0));
  assert_eq!(run_ok("var n = 0; true || (n = 1); n"), Lit::Num(0.0));
  assert_eq!(run_ok("0 || 'fallback'"), Lit::Str("fallback".to_string()));
  assert_eq!(run_ok("1 && 2"), Lit::Num(2.0));
}

#[test]
fn with_statement_resolves_through_object() {
  assert_eq!(
    run_ok("var o = { x: 1 }; with (o) { x = 2; } o.x"),
    Lit::Num(2.0)
  );
  assert_eq!(
    run_ok("var x = 1; var o = { }; with (o) { x = 2; } x"),
    Lit::Num(2.0)
  );
}

#[test]
fn typeof_tolerates_unresolved_names() {
  assert_eq!(run_ok("typeof missing"), Lit::Str("undefined".to_string()));
  assert_eq!(run_ok("typeof 1"), Lit::Str("number".to_string()));
  assert_eq!(run_ok("typeof 'a'"), Lit::Str("string".to_string()));
  assert_eq!(run_ok("typeof null"), Lit::Str("object".to_string()));
}
