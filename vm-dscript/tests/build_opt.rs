mod common;

use common::*;
use diagnostics::FileId;
use parse_dscript::ast::node::Node;
use parse_dscript::ast::stx::TopLevel;
use serde_json::json;
use serde_json::Value as Json;
use vm_dscript::build_program;
use vm_dscript::optimize_program;
use vm_dscript::OptimizeOptions;

fn optimized(source: &str, options: OptimizeOptions) -> Node<TopLevel> {
  let mut program = parse_dscript::parse(source).unwrap();
  build_program(&mut program, FileId(0), &[]);
  optimize_program(&mut program, &options);
  program
}

fn stmt_json(program: &Node<TopLevel>, index: usize) -> Json {
  serde_json::to_value(&program.stx.body[index]).unwrap()
}

#[test]
fn const_folding_replaces_pure_expressions() {
  let program = optimized("1 + 2 * 3;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0), json!({
    "$t": "Expr",
    "expr": { "$t": "LitNum", "value": 7.0 },
  }));
}

#[test]
fn const_folding_handles_strings_comparisons_and_typeof() {
  let program = optimized("'a' + 'b' === 'ab';", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"], json!({ "$t": "LitBool", "value": true }));

  let program = optimized("typeof 1;", OptimizeOptions::default());
  assert_eq!(
    stmt_json(&program, 0)["expr"],
    json!({ "$t": "LitStr", "value": "number" })
  );
}

#[test]
fn logical_and_conditional_folds_take_branches() {
  let program = optimized("true && x;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"], json!({ "$t": "Id", "name": "x" }));

  let program = optimized("false || y;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"], json!({ "$t": "Id", "name": "y" }));

  let program = optimized("false && x;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"], json!({ "$t": "LitBool", "value": false }));

  let program = optimized("true ? 1 : 2;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"], json!({ "$t": "LitNum", "value": 1.0 }));
}

#[test]
fn folding_does_not_touch_side_effects() {
  let program = optimized("f() + 1;", OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 0)["expr"]["$t"], "Binary");
}

#[test]
fn impossible_branch_keeps_taken_arm() {
  let program = optimized(
    "if (true) { taken(); } else { dropped(); }",
    OptimizeOptions::default(),
  );
  let stmt = stmt_json(&program, 0);
  assert_eq!(stmt["$t"], "Block");
  assert_eq!(stmt["body"][0]["expr"]["callee"]["name"], "taken");
}

#[test]
fn dropped_branches_preserve_var_hoisting() {
  // `hidden` must stay a declared (undefined) binding even though its branch
  // is eliminated.
  let program = optimized(
    "if (false) { var hidden = 1; } typeof hidden",
    OptimizeOptions::default(),
  );
  let stmt = stmt_json(&program, 0);
  assert_eq!(stmt["$t"], "Block");
  assert_eq!(stmt["body"][0]["$t"], "VarDecl");
  assert_eq!(stmt["body"][0]["declarators"][0]["name"], "hidden");

  assert_eq!(
    run_with(
      "if (false) { var hidden = 1; } typeof hidden",
      RunConfig {
        optimize: Some(OptimizeOptions::default()),
        ..RunConfig::default()
      },
    ),
    Ok(Lit::Str("undefined".to_string()))
  );
}

#[test]
fn unreachable_statements_are_pruned_but_declarations_survive() {
  let program = optimized(
    "function f() { return 1; sideEffect(); var kept = 2; function g() {} }",
    OptimizeOptions::default(),
  );
  let func = stmt_json(&program, 0);
  let body = func["func"]["body"].as_array().unwrap();
  assert_eq!(body[0]["$t"], "Return");
  // The call disappears; the declarations survive as hoist residue.
  assert!(body[1..].iter().all(|s| s["$t"] == "FunctionDecl" || s["$t"] == "VarDecl"));
  assert!(body[1..]
    .iter()
    .any(|s| s["$t"] == "VarDecl" && s["declarators"][0]["name"] == "kept"));
  assert!(!serde_json::to_string(&func).unwrap().contains("sideEffect"));
}

#[test]
fn hoisted_functions_after_return_still_run() {
  let source = "function g() { return f(); function f() { return 5; } } g()";
  assert_eq!(
    run_with(source, RunConfig {
      optimize: Some(OptimizeOptions::default()),
      ..RunConfig::default()
    }),
    Ok(Lit::Num(5.0))
  );
}

#[test]
fn loop_collapse_requires_the_flag() {
  let source = "var x = 0; do { x = x + 1; } while (false); x";

  let program = optimized(source, OptimizeOptions::default());
  assert_eq!(stmt_json(&program, 1)["$t"], "DoWhile");

  let program = optimized(source, OptimizeOptions {
    collapse_constant_loops: true,
  });
  assert_eq!(stmt_json(&program, 1)["$t"], "Block");
}

#[test]
fn loop_collapse_skips_loops_with_breaks() {
  let source = "var n = 0; a: do { n = n + 1; break a; } while (true); n";
  let program = optimized(source, OptimizeOptions {
    collapse_constant_loops: true,
  });
  // The label wraps the loop; the loop itself must still be a do-while.
  let label = stmt_json(&program, 1);
  assert_eq!(label["$t"], "Label");
  assert_eq!(label["statement"]["$t"], "DoWhile");
}

#[test]
fn constant_true_do_while_normalizes_to_while() {
  // No break/continue: the canonical infinite shape. Bounded by fuel here
  // since the loop genuinely never exits.
  let program = optimized("do { tick(); } while (true);", OptimizeOptions {
    collapse_constant_loops: true,
  });
  assert_eq!(stmt_json(&program, 0)["$t"], "While");
}

#[test]
fn optimization_preserves_observable_behavior() {
  let sources = [
    "var x = 0; do { x = x + 1; } while (false); x",
    "var log = ''; while (false) { log = log + 'n'; } log",
    "var i = 0; do { i = i + 1; } while (i < 3); i",
    "var n = 0; a: do { n = n + 1; break a; } while (true); n",
    "1 + 2 * 3",
    "if (1 < 2) { 'yes'; } else { 'no'; }",
    "var r; try { throw 1 + 1; } catch (e) { r = e; } r",
    "switch (1 + 1) { case 2: 'two'; break; default: 'other'; }",
  ];
  for source in sources {
    let plain = run(source);
    let optimized = run_with(source, RunConfig {
      optimize: Some(OptimizeOptions {
        collapse_constant_loops: true,
      }),
      ..RunConfig::default()
    });
    assert_eq!(plain, optimized, "behavior diverged for {:?}", source);
  }
}
