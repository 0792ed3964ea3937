use super::Parser;
use crate::ast::node::Node;
use crate::ast::stx::TopLevel;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::error::SyntaxWarningType;
use crate::lex::Lexer;
use serde_json::json;
use serde_json::Value;

fn parse(source: &str) -> SyntaxResult<Node<TopLevel>> {
  crate::parse(source)
}

fn parse_err(source: &str) -> SyntaxErrorType {
  parse(source).expect_err("expected parse failure").typ
}

fn parse_stmt_and_serialize(input: &str) -> Value {
  let mut parser = Parser::new(Lexer::new(input));
  let node = parser.stmt().unwrap();
  serde_json::to_value(&node).unwrap()
}

#[test]
fn parses_do_while() {
  assert_eq!(parse_stmt_and_serialize("do { x; } while (x < 3);"), json!({
    "$t": "DoWhile",
    "condition": {
      "$t": "Binary",
      "operator": "LessThan",
      "left": { "$t": "Id", "name": "x" },
      "right": { "$t": "LitNum", "value": 3.0 },
    },
    "body": {
      "$t": "Block",
      "body": [
        { "$t": "Expr", "expr": { "$t": "Id", "name": "x" } },
      ],
    },
  }));
}

#[test]
fn parses_switch_branches_in_declaration_order() {
  let value = parse_stmt_and_serialize("switch (x) { case 1: a; case 2: b; default: c; }");
  assert_eq!(value["$t"], "Switch");
  let branches = value["branches"].as_array().unwrap();
  assert_eq!(branches.len(), 3);
  assert_eq!(branches[0]["case"]["value"], json!(1.0));
  assert_eq!(branches[1]["case"]["value"], json!(2.0));
  assert_eq!(branches[2]["case"], Value::Null);
}

#[test]
fn parses_try_catch_finally() {
  let value =
    parse_stmt_and_serialize("try { a; } catch (e) { b; } finally { c; }");
  assert_eq!(value["$t"], "Try");
  assert_eq!(value["catch"]["parameter"], "e");
  assert_eq!(value["finally"]["body"].as_array().unwrap().len(), 1);
}

#[test]
fn parses_labeled_loop_with_labeled_exits() {
  let top = parse(
    r#"
      outer: while (a) {
        while (b) {
          continue outer;
        }
        break outer;
      }
    "#,
  )
  .unwrap();
  assert_eq!(top.stx.body.len(), 1);
}

#[test]
fn empty_switch_is_a_parse_error() {
  assert_eq!(
    parse_err("switch (x) {}"),
    SyntaxErrorType::SwitchStatementHasNoCases
  );
}

#[test]
fn duplicate_default_is_a_parse_error() {
  assert_eq!(
    parse_err("switch (x) { default: a; case 1: b; default: c; }"),
    SyntaxErrorType::DuplicateDefaultCase
  );
}

#[test]
fn try_without_catch_or_finally_is_a_parse_error() {
  assert_eq!(
    parse_err("try { a; }"),
    SyntaxErrorType::TryStatementHasNoCatchOrFinally
  );
}

#[test]
fn failed_parse_leaves_state_stacks_balanced() {
  for source in [
    "switch (x) { default: a; default: b; }",
    "try { a; }",
    "while (x) { switch (y) { } }",
    "do { continue missing; } while (x);",
  ] {
    let mut parser = Parser::new(Lexer::new(source));
    let before = parser.state().stack_depths();
    parser.parse_top_level().unwrap_err();
    assert_eq!(
      parser.state().stack_depths(),
      before,
      "unbalanced stacks after failing to parse {:?}",
      source
    );
  }
}

#[test]
fn break_and_continue_labels_are_validated_from_parse_state() {
  assert_eq!(
    parse_err("while (x) { continue missing; }"),
    SyntaxErrorType::ContinueToUndefinedLabel
  );
  assert_eq!(
    parse_err("while (x) { break missing; }"),
    SyntaxErrorType::BreakToUndefinedLabel
  );
  // A label on a non-iteration statement is a legal break target but not a
  // legal continue target.
  assert!(parse("block: { break block; }").is_ok());
  assert_eq!(
    parse_err("block: { while (x) { continue block; } }"),
    SyntaxErrorType::ContinueLabelNotLoop
  );
}

#[test]
fn chained_labels_target_the_same_loop() {
  assert!(parse("a: b: while (x) { continue a; continue b; }").is_ok());
}

#[test]
fn duplicate_active_label_is_a_parse_error() {
  assert_eq!(
    parse_err("a: a: while (x) {}"),
    SyntaxErrorType::DuplicateLabel
  );
}

#[test]
fn naked_break_and_continue_require_enclosing_construct() {
  assert_eq!(parse_err("break;"), SyntaxErrorType::IllegalBreak);
  assert_eq!(parse_err("continue;"), SyntaxErrorType::IllegalContinue);
  // A switch makes break legal but not continue.
  assert!(parse("switch (x) { case 1: break; }").is_ok());
  assert_eq!(
    parse_err("switch (x) { case 1: continue; }"),
    SyntaxErrorType::IllegalContinue
  );
  // A loop enclosing a switch makes continue legal inside the switch.
  assert!(parse("while (x) { switch (y) { case 1: continue; } }").is_ok());
  // Function bodies reset loop context.
  assert_eq!(
    parse_err("while (x) { function f() { break; } }"),
    SyntaxErrorType::IllegalBreak
  );
}

#[test]
fn labels_do_not_cross_function_boundaries() {
  assert_eq!(
    parse_err("a: while (x) { function f() { while (y) { continue a; } } }"),
    SyntaxErrorType::ContinueToUndefinedLabel
  );
}

#[test]
fn return_is_only_legal_inside_functions() {
  assert_eq!(parse_err("return 1;"), SyntaxErrorType::IllegalReturn);
  assert!(parse("function f() { return 1; }").is_ok());
}

#[test]
fn strict_mode_rejections() {
  assert_eq!(
    parse_err("'use strict'; with (x) { y; }"),
    SyntaxErrorType::StrictModeWith
  );
  assert_eq!(
    parse_err("'use strict'; try { a; } catch (arguments) { b; }"),
    SyntaxErrorType::StrictModeRestrictedName
  );
  assert_eq!(
    parse_err("'use strict'; var x = 010;"),
    SyntaxErrorType::StrictModeLegacyOctal
  );
  assert_eq!(
    parse_err("'use strict'; while (x) function f() {}"),
    SyntaxErrorType::StrictModeFunctionPosition
  );
  assert_eq!(
    parse_err("'use strict'; var eval = 1;"),
    SyntaxErrorType::StrictModeRestrictedName
  );
}

#[test]
fn function_body_directive_enables_strict_locally() {
  assert_eq!(
    parse_err("function f() { 'use strict'; with (x) {} }"),
    SyntaxErrorType::StrictModeWith
  );
  // The enclosing sloppy scope is unaffected.
  assert!(parse("function f() { 'use strict'; } with (x) {}").is_ok());
}

#[test]
fn sloppy_mode_wraps_naked_loop_body_function_in_block() {
  let top = parse("while (x) function f() {}").unwrap();
  let value = serde_json::to_value(&top.stx.body[0]).unwrap();
  assert_eq!(value["$t"], "While");
  assert_eq!(value["body"]["$t"], "Block");
  assert_eq!(value["body"]["body"][0]["$t"], "FunctionDecl");
}

#[test]
fn const_requires_initializer() {
  assert_eq!(
    parse_err("const x;"),
    SyntaxErrorType::ConstWithoutInitializer
  );
  assert!(parse("const x = 1;").is_ok());
}

#[test]
fn throw_rejects_line_terminator_before_operand() {
  assert_eq!(
    parse_err("throw\n1;"),
    SyntaxErrorType::LineTerminatorAfterThrow
  );
}

#[test]
fn return_asi_drops_value_after_line_terminator() {
  let top = parse("function f() { return\n1; }").unwrap();
  let value = serde_json::to_value(&top.stx.body[0]).unwrap();
  let body = value["func"]["body"].as_array().unwrap();
  assert_eq!(body[0]["$t"], "Return");
  assert_eq!(body[0]["value"], Value::Null);
}

#[test]
fn warnings_are_buffered_independently_of_success() {
  let mut parser = Parser::new(Lexer::new(
    "switch (x) { case 1: a; case 1: b; } with (y) { z; }",
  ));
  parser.parse_top_level().unwrap();
  let warnings: Vec<_> = parser.warnings().iter().map(|w| w.typ).collect();
  assert!(warnings.contains(&SyntaxWarningType::DuplicateCaseValue));
  assert!(warnings.contains(&SyntaxWarningType::WithStatement));
}

#[test]
fn unreachable_statement_warns_once() {
  let mut parser = Parser::new(Lexer::new(
    "function f() { return 1; a; b; var c = 1; }",
  ));
  parser.parse_top_level().unwrap();
  let count = parser
    .warnings()
    .iter()
    .filter(|w| w.typ == SyntaxWarningType::UnreachableStatement)
    .count();
  assert_eq!(count, 1);
}

#[test]
fn loop_exit_usage_is_tagged_on_loop_nodes() {
  use crate::ast::stmt::LoopExitUsage;
  let mut parser = Parser::new(Lexer::new("while (x) { break; }"));
  let node = parser.while_stmt().unwrap();
  let usage = node.assoc.get::<LoopExitUsage>().unwrap();
  assert!(usage.has_break);
  assert!(!usage.has_continue);

  let mut parser = Parser::new(Lexer::new("while (x) { y; }"));
  let node = parser.while_stmt().unwrap();
  let usage = node.assoc.get::<LoopExitUsage>().unwrap();
  assert!(!usage.has_break);
  assert!(!usage.has_continue);
}

#[test]
fn expression_statements_honor_asi() {
  assert!(parse("a\nb\nc").is_ok());
  assert!(parse("a; b; c").is_ok());
}

#[test]
fn assignment_and_conditional_parse_with_expected_precedence() {
  let value = parse_stmt_and_serialize("x = a || b ? 1 : 2;");
  assert_eq!(value["$t"], "Expr");
  let expr = &value["expr"];
  assert_eq!(expr["$t"], "Binary");
  assert_eq!(expr["operator"], "Assignment");
  assert_eq!(expr["right"]["$t"], "Cond");
  assert_eq!(expr["right"]["test"]["operator"], "LogicalOr");
}
