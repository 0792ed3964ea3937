mod common;

use common::*;
use diagnostics::FileId;
use std::cell::RefCell;
use std::rc::Rc;
use vm_dscript::build_program;
use vm_dscript::value::to_js_string;
use vm_dscript::HostError;
use vm_dscript::Interpreter;
use vm_dscript::NativeCall;
use vm_dscript::TerminationReason;
use vm_dscript::Value;
use vm_dscript::VmError;
use vm_dscript::VmOptions;

#[test]
fn calls_bind_parameters_and_return() {
  assert_eq!(run_ok("function f(a) { return a; } f(5)"), Lit::Num(5.0));
  assert_eq!(
    run_ok("function add(a, b) { return a + b; } add(2, 3)"),
    Lit::Num(5.0)
  );
  // Missing arguments are undefined; extra arguments are ignored.
  assert_eq!(
    run_ok("function f(a, b) { return typeof b; } f(1)"),
    Lit::Str("undefined".to_string())
  );
  assert_eq!(run_ok("function f(a) { return a; } f(1, 2, 3)"), Lit::Num(1.0));
}

#[test]
fn function_declarations_hoist_within_their_list() {
  assert_eq!(run_ok("var r = f(); function f() { return 7; } r"), Lit::Num(7.0));
}

#[test]
fn functions_without_return_produce_undefined() {
  assert_eq!(run_ok("function f() { 1; } f()"), Lit::Undefined);
  assert_eq!(run_ok("function f() { return; } f()"), Lit::Undefined);
}

#[test]
fn closures_capture_their_environment() {
  assert_eq!(
    run_ok(
      r#"
        function counter() {
          var n = 0;
          return function () { n = n + 1; return n; };
        }
        var c = counter();
        c(); c();
        c()
      "#,
    ),
    Lit::Num(3.0)
  );
  // Two closures over distinct activations are independent.
  assert_eq!(
    run_ok(
      r#"
        function counter() {
          var n = 0;
          return function () { n = n + 1; return n; };
        }
        var a = counter();
        var b = counter();
        a(); a();
        b();
        a() * 10 + b()
      "#,
    ),
    Lit::Num(32.0)
  );
}

#[test]
fn bindings_used_across_try_are_captured_correctly() {
  assert_eq!(
    run_ok(
      r#"
        function make() {
          var n = 0;
          try { n = 1; } finally {}
          return function () { return n; };
        }
        make()()
      "#,
    ),
    Lit::Num(1.0)
  );
}

#[test]
fn recursion_works() {
  assert_eq!(
    run_ok("function fac(n) { if (n <= 1) { return 1; } return n * fac(n - 1); } fac(5)"),
    Lit::Num(120.0)
  );
}

#[test]
fn named_function_expressions_can_recurse() {
  assert_eq!(
    run_ok(
      r#"
        var f = function fac(n) { return n <= 1 ? 1 : n * fac(n - 1); };
        f(4)
      "#,
    ),
    Lit::Num(24.0)
  );
}

#[test]
fn arguments_is_bound_in_function_bodies() {
  assert_eq!(
    run_ok("function f() { return arguments.length + arguments[0]; } f(10, 20)"),
    Lit::Num(12.0)
  );
}

#[test]
fn calling_a_non_function_throws_type_error() {
  let thrown = run_uncaught("(0)();");
  assert!(matches!(thrown, Lit::Err(name, _) if name == "TypeError"));
}

#[test]
fn runaway_recursion_terminates_with_stack_overflow() {
  assert_eq!(
    run("function f() { return f(); } f()"),
    Err(RunError::Terminated(TerminationReason::StackOverflow))
  );
}

#[test]
fn fuel_budget_terminates_infinite_loops() {
  let config = RunConfig {
    options: VmOptions {
      default_fuel: Some(10_000),
      ..VmOptions::default()
    },
    ..RunConfig::default()
  };
  assert_eq!(
    run_with("while (true) {}", config),
    Err(RunError::Terminated(TerminationReason::OutOfFuel))
  );
}

#[test]
fn termination_is_not_catchable_by_script() {
  let config = RunConfig {
    options: VmOptions {
      default_fuel: Some(10_000),
      ..VmOptions::default()
    },
    ..RunConfig::default()
  };
  assert_eq!(
    run_with("try { while (true) {} } catch (e) { 'caught' }", config),
    Err(RunError::Terminated(TerminationReason::OutOfFuel))
  );
}

#[test]
fn preset_interrupt_flag_terminates_immediately() {
  let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
  let config = RunConfig {
    options: VmOptions {
      interrupt_flag: Some(flag),
      ..VmOptions::default()
    },
    ..RunConfig::default()
  };
  assert_eq!(
    run_with("1;", config),
    Err(RunError::Terminated(TerminationReason::Interrupted))
  );
}

struct Collect {
  out: Rc<RefCell<Vec<String>>>,
}

impl NativeCall for Collect {
  fn call<'p>(&self, args: &[Value<'p>]) -> Result<Value<'p>, HostError> {
    let line = args.iter().map(to_js_string).collect::<Vec<_>>().join(" ");
    self.out.borrow_mut().push(line);
    Ok(Value::Undefined)
  }
}

struct Fail;

impl NativeCall for Fail {
  fn call<'p>(&self, _args: &[Value<'p>]) -> Result<Value<'p>, HostError> {
    Err(HostError::new("StorageError", "disk offline"))
  }
}

#[test]
fn natives_receive_arguments_and_return_values() {
  let out = Rc::new(RefCell::new(Vec::new()));
  let mut interpreter = Interpreter::new(VmOptions::default());
  interpreter.register_native("print", Rc::new(Collect { out: out.clone() }));

  let mut program =
    parse_dscript::parse("print('hello', 1 + 1); print([1, 2]);").unwrap();
  let build = build_program(&mut program, FileId(0), &interpreter.native_names());
  assert!(build.warnings.is_empty());
  interpreter.exec(&program).unwrap();
  assert_eq!(*out.borrow(), vec!["hello 2", "1,2"]);
}

#[test]
fn host_errors_are_wrapped_once_and_catchable() {
  let mut interpreter = Interpreter::new(VmOptions::default());
  interpreter.register_native("fail", Rc::new(Fail));

  let program = parse_dscript::parse(
    "var r; try { fail(); } catch (e) { r = e.name + ':' + e.message; } r",
  )
  .unwrap();
  let value = interpreter.exec(&program).unwrap();
  assert_eq!(to_js_string(&value), "StorageError:disk offline");
}

#[test]
fn uncaught_host_error_propagates_as_thrown_value() {
  let mut interpreter = Interpreter::new(VmOptions::default());
  interpreter.register_native("fail", Rc::new(Fail));

  let program = parse_dscript::parse("fail();").unwrap();
  let err = interpreter.exec(&program).unwrap_err();
  let VmError::Throw(value) = err else {
    panic!("expected an uncaught throw");
  };
  assert!(matches!(lit(&value), Lit::Err(name, _) if name == "StorageError"));
}

#[test]
fn strict_directive_in_function_is_scoped_to_it() {
  // The strict callee rejects unresolved assignment; the sloppy caller does
  // not.
  assert_eq!(
    run_ok(
      r#"
        function strictFn() {
          'use strict';
          var r;
          try { oops = 1; } catch (e) { r = e.name; }
          return r;
        }
        sloppy = 1;
        strictFn()
      "#,
    ),
    Lit::Str("ReferenceError".to_string())
  );
}
