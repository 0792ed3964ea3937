mod common;

use common::*;

#[test]
fn do_while_body_runs_before_first_condition_check() {
  // Starting at x = 0, the body runs exactly 3 times.
  assert_eq!(
    run_ok("var x = 0; do { x = x + 1; } while (x < 3); x"),
    Lit::Num(3.0)
  );
  // Even a false condition admits one iteration.
  assert_eq!(
    run_ok("var runs = 0; do { runs = runs + 1; } while (false); runs"),
    Lit::Num(1.0)
  );
}

#[test]
fn while_checks_condition_before_first_iteration() {
  assert_eq!(
    run_ok("var runs = 0; while (false) { runs = runs + 1; } runs"),
    Lit::Num(0.0)
  );
}

#[test]
fn for_triple_loops() {
  assert_eq!(
    run_ok("var sum = 0; for (var i = 1; i <= 4; i = i + 1) { sum = sum + i; } sum"),
    Lit::Num(10.0)
  );
  assert_eq!(
    run_ok("var n = 0; for (;;) { n = n + 1; if (n === 5) { break; } } n"),
    Lit::Num(5.0)
  );
}

#[test]
fn unlabeled_continue_targets_the_inner_loop() {
  assert_eq!(
    run_ok(
      r#"
        var count = 0;
        for (var i = 0; i < 3; i = i + 1) {
          for (var j = 0; j < 3; j = j + 1) {
            if (j > 0) { continue; }
            count = count + 1;
          }
        }
        count
      "#,
    ),
    Lit::Num(3.0)
  );
}

#[test]
fn labeled_continue_resumes_the_outer_loop() {
  // `continue outer` must end only the inner loop's current iteration and
  // resume the outer loop's update/condition, never the inner loop's.
  assert_eq!(
    run_ok(
      r#"
        var outerIterations = 0;
        var innerStarts = 0;
        var reached = 0;
        outer: for (var i = 0; i < 3; i = i + 1) {
          outerIterations = outerIterations + 1;
          for (var j = 0; j < 5; j = j + 1) {
            innerStarts = innerStarts + 1;
            if (j === 1) { continue outer; }
          }
          reached = reached + 1;
        }
        [outerIterations, innerStarts, reached]
      "#,
    ),
    Lit::Arr("3,6,0".to_string())
  );
}

#[test]
fn labeled_break_unwinds_through_inner_loops() {
  assert_eq!(
    run_ok(
      r#"
        var steps = '';
        outer: while (true) {
          steps = steps + 'o';
          while (true) {
            steps = steps + 'i';
            break outer;
          }
          steps = steps + 'x';
        }
        steps
      "#,
    ),
    Lit::Str("oi".to_string())
  );
}

#[test]
fn chained_labels_share_one_target() {
  assert_eq!(
    run_ok(
      r#"
        var n = 0;
        a: b: while (n < 10) {
          n = n + 1;
          if (n === 2) { break a; }
        }
        n
      "#,
    ),
    Lit::Num(2.0)
  );
}

#[test]
fn labeled_block_break_is_consumed_by_the_label() {
  assert_eq!(run_ok("a: { 1; break a; }"), Lit::Num(1.0));
  assert_eq!(run_ok("1; a: { break a; }"), Lit::Num(1.0));
  assert_eq!(
    run_ok("var log = ''; a: { log = log + 'x'; break a; log = log + 'y'; } log"),
    Lit::Str("x".to_string())
  );
}

#[test]
fn loop_completion_values_follow_the_last_value_slot() {
  assert_eq!(run_ok("while (true) { 1; break; }"), Lit::Num(1.0));
  assert_eq!(run_ok("1; while (false) {}"), Lit::Undefined);
  assert_eq!(run_ok("while (false) {} 1"), Lit::Num(1.0));
}

#[test]
fn labeled_continue_through_do_while_checks_outer_condition() {
  assert_eq!(
    run_ok(
      r#"
        var trips = 0;
        var x = 0;
        outer: do {
          trips = trips + 1;
          x = x + 1;
          do {
            continue outer;
          } while (true);
        } while (x < 3);
        [trips, x]
      "#,
    ),
    Lit::Arr("3,3".to_string())
  );
}
