use crate::env::ScopeRef;
use crate::error::HostError;
use ahash::HashMap;
use ahash::HashMapExt;
use parse_dscript::ast::func::Func;
use parse_dscript::char::is_line_terminator;
use parse_dscript::char::WHITESPACE_CHARS;
use parse_dscript::num::JsNumber;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::rc::Rc;

/// A user-defined script function: a reference into the program tree plus the
/// scope it closed over.
pub struct ScriptFn<'p> {
  pub name: Option<String>,
  pub func: &'p Func,
  pub closure: ScopeRef<'p>,
}

/// A host-registered function. The generic lifetime on `call` lets one
/// registration serve every program the interpreter runs.
pub trait NativeCall {
  fn call<'p>(&self, args: &[Value<'p>]) -> Result<Value<'p>, HostError>;
}

pub type ObjMap<'p> = HashMap<String, Value<'p>>;

/// A runtime value. Reference values (arrays, objects, functions) compare by
/// identity; everything else by content.
///
/// Values are deliberately not `Send`: one evaluation owns its state, and
/// concurrency across evaluations is disjoint-state-per-thread.
#[derive(Clone)]
pub enum Value<'p> {
  Undefined,
  Null,
  Bool(bool),
  Num(JsNumber),
  Str(Rc<str>),
  Arr(Rc<RefCell<Vec<Value<'p>>>>),
  Obj(Rc<RefCell<ObjMap<'p>>>),
  Func(Rc<ScriptFn<'p>>),
  Native(Rc<dyn NativeCall + 'p>),
}

impl<'p> Value<'p> {
  pub fn str(s: impl AsRef<str>) -> Value<'p> {
    Value::Str(Rc::from(s.as_ref()))
  }

  pub fn num(n: f64) -> Value<'p> {
    Value::Num(JsNumber(n))
  }

  pub fn new_obj() -> Value<'p> {
    Value::Obj(Rc::new(RefCell::new(ObjMap::new())))
  }

  pub fn new_arr(elements: Vec<Value<'p>>) -> Value<'p> {
    Value::Arr(Rc::new(RefCell::new(elements)))
  }

  pub fn type_of(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "object",
      Value::Bool(_) => "boolean",
      Value::Num(_) => "number",
      Value::Str(_) => "string",
      Value::Arr(_) | Value::Obj(_) => "object",
      Value::Func(_) | Value::Native(_) => "function",
    }
  }

  pub fn is_reference(&self) -> bool {
    matches!(
      self,
      Value::Arr(_) | Value::Obj(_) | Value::Func(_) | Value::Native(_)
    )
  }
}

/// Builds the canonical error-object shape thrown for runtime faults and
/// wrapped host errors: `{ name, message }`.
pub fn make_error<'p>(name: &str, message: impl Into<String>) -> Value<'p> {
  let mut map = ObjMap::new();
  map.insert("name".to_string(), Value::str(name));
  map.insert("message".to_string(), Value::str(message.into()));
  Value::Obj(Rc::new(RefCell::new(map)))
}

pub fn to_boolean(value: &Value) -> bool {
  match value {
    Value::Undefined | Value::Null => false,
    Value::Bool(b) => *b,
    Value::Num(n) => n.0 != 0.0 && !n.0.is_nan(),
    Value::Str(s) => !s.is_empty(),
    Value::Arr(_) | Value::Obj(_) | Value::Func(_) | Value::Native(_) => true,
  }
}

pub fn to_number(value: &Value) -> f64 {
  match value {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(b) => {
      if *b {
        1.0
      } else {
        0.0
      }
    }
    Value::Num(n) => n.0,
    Value::Str(s) => str_to_number(s),
    // Reference values coerce through their primitive string form.
    other => str_to_number(&to_js_string(other)),
  }
}

fn is_script_whitespace(c: char) -> bool {
  WHITESPACE_CHARS.contains(&c) || is_line_terminator(c)
}

pub fn str_to_number(raw: &str) -> f64 {
  let trimmed = raw.trim_matches(is_script_whitespace);
  if trimmed.is_empty() {
    return 0.0;
  }
  let (sign, body) = match trimmed.strip_prefix('-') {
    Some(rest) => (-1.0, rest),
    None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
  };
  if body == "Infinity" {
    return sign * f64::INFINITY;
  }
  let has_radix_prefix = body.len() > 1
    && body.starts_with('0')
    && matches!(body.as_bytes()[1], b'x' | b'X' | b'o' | b'O' | b'b' | b'B');
  if has_radix_prefix {
    // Radix-prefixed forms never take a sign.
    if sign > 0.0 {
      return JsNumber::from_literal(body).map(|v| v.0).unwrap_or(f64::NAN);
    }
    return f64::NAN;
  }
  body.parse::<f64>().map(|v| sign * v).unwrap_or(f64::NAN)
}

pub fn to_js_string(value: &Value) -> String {
  match value {
    Value::Undefined => "undefined".to_string(),
    Value::Null => "null".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Num(n) => n.to_js_string(),
    Value::Str(s) => s.to_string(),
    Value::Arr(elements) => {
      let elements = elements.borrow();
      elements
        .iter()
        .map(|v| match v {
          Value::Undefined | Value::Null => String::new(),
          other => to_js_string(other),
        })
        .collect::<Vec<_>>()
        .join(",")
    }
    Value::Obj(_) => "[object Object]".to_string(),
    Value::Func(f) => match &f.name {
      Some(name) => format!("function {}() {{ ... }}", name),
      None => "function () { ... }".to_string(),
    },
    Value::Native(_) => "function () { [native code] }".to_string(),
  }
}

/// Strict equality: no coercion, `NaN !== NaN`, reference values by identity.
pub fn strict_eq<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
  match (a, b) {
    (Value::Undefined, Value::Undefined) => true,
    (Value::Null, Value::Null) => true,
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Num(x), Value::Num(y)) => x.0 == y.0,
    (Value::Str(x), Value::Str(y)) => x == y,
    (Value::Arr(x), Value::Arr(y)) => Rc::ptr_eq(x, y),
    (Value::Obj(x), Value::Obj(y)) => Rc::ptr_eq(x, y),
    (Value::Func(x), Value::Func(y)) => Rc::ptr_eq(x, y),
    (Value::Native(x), Value::Native(y)) => Rc::ptr_eq(x, y),
    _ => false,
  }
}

/// Loose equality with the standard coercions.
pub fn loose_eq<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
  match (a, b) {
    (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
    (Value::Num(_), Value::Num(_))
    | (Value::Str(_), Value::Str(_))
    | (Value::Bool(_), Value::Bool(_)) => strict_eq(a, b),
    (Value::Num(_), Value::Str(_)) | (Value::Str(_), Value::Num(_)) => {
      to_number(a) == to_number(b)
    }
    (Value::Bool(_), _) => loose_eq(&Value::num(to_number(a)), b),
    (_, Value::Bool(_)) => loose_eq(a, &Value::num(to_number(b))),
    (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
    _ if a.is_reference() && b.is_reference() => strict_eq(a, b),
    _ if a.is_reference() => loose_eq(&Value::str(to_js_string(a)), b),
    _ => loose_eq(a, &Value::str(to_js_string(b))),
  }
}

pub fn to_int32(n: f64) -> i32 {
  if !n.is_finite() || n == 0.0 {
    return 0;
  }
  let n = n.trunc();
  let m = n.rem_euclid(4294967296.0);
  let m = if m >= 2147483648.0 {
    m - 4294967296.0
  } else {
    m
  };
  m as i32
}

pub fn to_uint32(n: f64) -> u32 {
  if !n.is_finite() || n == 0.0 {
    return 0;
  }
  n.trunc().rem_euclid(4294967296.0) as u32
}

impl<'p> Debug for Value<'p> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Value::Undefined => write!(f, "undefined"),
      Value::Null => write!(f, "null"),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Num(n) => write!(f, "{}", n.to_js_string()),
      Value::Str(s) => write!(f, "{:?}", s),
      Value::Arr(_) | Value::Obj(_) => write!(f, "{}", to_js_string(self)),
      Value::Func(_) | Value::Native(_) => write!(f, "{}", to_js_string(self)),
    }
  }
}

impl<'p> Display for Value<'p> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", to_js_string(self))
  }
}

// Content equality for primitives, identity for reference values. NaN equals
// NaN here (via JsNumber) so tests can assert on NaN results; use
// [`strict_eq`] for script semantics.
impl<'p> PartialEq for Value<'p> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Num(x), Value::Num(y)) => x == y,
      _ => strict_eq(self, other),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strict_eq_never_coerces() {
    assert!(!strict_eq(&Value::num(1.0), &Value::str("1")));
    assert!(!strict_eq(&Value::Bool(true), &Value::num(1.0)));
    assert!(!strict_eq(&Value::Null, &Value::Undefined));
    assert!(strict_eq(&Value::num(0.0), &Value::num(-0.0)));
    assert!(!strict_eq(&Value::num(f64::NAN), &Value::num(f64::NAN)));
  }

  #[test]
  fn reference_values_compare_by_identity() {
    let a = Value::new_arr(vec![Value::num(1.0)]);
    let b = Value::new_arr(vec![Value::num(1.0)]);
    assert!(!strict_eq(&a, &b));
    assert!(strict_eq(&a, &a.clone()));
  }

  #[test]
  fn loose_eq_coerces() {
    assert!(loose_eq(&Value::num(1.0), &Value::str("1")));
    assert!(loose_eq(&Value::Bool(true), &Value::num(1.0)));
    assert!(loose_eq(&Value::Null, &Value::Undefined));
    assert!(!loose_eq(&Value::Null, &Value::num(0.0)));
  }

  #[test]
  fn string_to_number_coercions() {
    assert_eq!(str_to_number(""), 0.0);
    assert_eq!(str_to_number("  42  "), 42.0);
    assert_eq!(str_to_number("0x10"), 16.0);
    assert_eq!(str_to_number("-Infinity"), f64::NEG_INFINITY);
    assert!(str_to_number("12abc").is_nan());
  }

  #[test]
  fn int32_conversion_wraps() {
    assert_eq!(to_int32(4294967296.0), 0);
    assert_eq!(to_int32(2147483648.0), -2147483648);
    assert_eq!(to_int32(-1.5), -1);
    assert_eq!(to_int32(f64::NAN), 0);
  }

  #[test]
  fn array_string_form_joins_elements() {
    let arr = Value::new_arr(vec![
      Value::num(1.0),
      Value::Undefined,
      Value::str("x"),
    ]);
    assert_eq!(to_js_string(&arr), "1,,x");
  }
}
