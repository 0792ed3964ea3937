mod common;

use common::*;

#[test]
fn fallthrough_runs_from_the_matched_case_to_the_end() {
  // switch(2) matches case 2 and falls through case 3 and default.
  assert_eq!(
    run_ok(
      r#"
        var log = '';
        switch (2) {
          case 1: log = log + 'a';
          case 2: log = log + 'b';
          case 3: log = log + 'c';
          default: log = log + 'd';
        }
        log
      "#,
    ),
    Lit::Str("bcd".to_string())
  );
}

#[test]
fn break_stops_fallthrough() {
  assert_eq!(
    run_ok(
      r#"
        var log = '';
        switch (2) {
          case 1: log = log + 'a'; break;
          case 2: log = log + 'b'; break;
          case 3: log = log + 'c'; break;
        }
        log
      "#,
    ),
    Lit::Str("b".to_string())
  );
}

#[test]
fn default_runs_only_when_nothing_matches() {
  let source = |subject: &str| {
    format!(
      r#"
        var log = '';
        switch ({subject}) {{
          case 1: log = log + 'one'; break;
          default: log = log + 'other'; break;
          case 2: log = log + 'two'; break;
        }}
        log
      "#
    )
  };
  assert_eq!(run_ok(&source("1")), Lit::Str("one".to_string()));
  // Cases after `default` still match first.
  assert_eq!(run_ok(&source("2")), Lit::Str("two".to_string()));
  assert_eq!(run_ok(&source("3")), Lit::Str("other".to_string()));
}

#[test]
fn default_falls_through_to_following_cases() {
  assert_eq!(
    run_ok(
      r#"
        var log = '';
        switch (9) {
          case 1: log = log + 'a';
          default: log = log + 'd';
          case 2: log = log + 'b';
        }
        log
      "#,
    ),
    Lit::Str("db".to_string())
  );
}

#[test]
fn case_matching_uses_strict_equality() {
  assert_eq!(
    run_ok(
      r#"
        var log = '';
        switch ('2') {
          case 2: log = 'number'; break;
          default: log = 'default'; break;
        }
        log
      "#,
    ),
    Lit::Str("default".to_string())
  );
}

#[test]
fn subject_is_evaluated_once() {
  assert_eq!(
    run_ok(
      r#"
        var calls = 0;
        function subject() { calls = calls + 1; return 2; }
        switch (subject()) {
          case 1: break;
          case 2: break;
          default: break;
        }
        calls
      "#,
    ),
    Lit::Num(1.0)
  );
}

#[test]
fn case_expressions_evaluate_in_order_until_the_match() {
  assert_eq!(
    run_ok(
      r#"
        var trace = '';
        function c(v, tag) { trace = trace + tag; return v; }
        switch (2) {
          case c(1, '1'): trace = trace + 'A'; break;
          case c(2, '2'): trace = trace + 'B'; break;
          case c(3, '3'): trace = trace + 'C'; break;
        }
        trace
      "#,
    ),
    Lit::Str("12B".to_string())
  );
}

#[test]
fn return_and_throw_propagate_out_of_case_bodies() {
  assert_eq!(
    run_ok(
      r#"
        function pick(x) {
          switch (x) {
            case 1: return 'one';
            case 2: return 'two';
          }
          return 'other';
        }
        pick(1) + ':' + pick(2) + ':' + pick(3)
      "#,
    ),
    Lit::Str("one:two:other".to_string())
  );
  let thrown = run_uncaught("switch (1) { case 1: throw 'boom'; }");
  assert_eq!(thrown, Lit::Str("boom".to_string()));
}

#[test]
fn continue_inside_switch_targets_the_enclosing_loop() {
  assert_eq!(
    run_ok(
      r#"
        var evens = 0;
        for (var i = 0; i < 6; i = i + 1) {
          switch (i % 2) {
            case 1: continue;
          }
          evens = evens + 1;
        }
        evens
      "#,
    ),
    Lit::Num(3.0)
  );
}

#[test]
fn labeled_break_inside_switch_exits_the_labeled_loop() {
  assert_eq!(
    run_ok(
      r#"
        var n = 0;
        outer: while (true) {
          n = n + 1;
          switch (n) {
            case 3: break outer;
          }
        }
        n
      "#,
    ),
    Lit::Num(3.0)
  );
}
