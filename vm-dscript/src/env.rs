use crate::value::Value;
use ahash::HashMap;
use ahash::HashMapExt;
use std::cell::RefCell;
use std::rc::Rc;

/// What kind of frame a scope is. `var` declarations hoist to the nearest
/// `Function` frame; `With` frames resolve names through their object before
/// falling back to the chain.
pub enum ScopeKind<'p> {
  Block,
  Function,
  With(Value<'p>),
}

struct Binding<'p> {
  value: Value<'p>,
  mutable: bool,
}

pub struct Scope<'p> {
  kind: ScopeKind<'p>,
  bindings: HashMap<String, Binding<'p>>,
  parent: Option<ScopeRef<'p>>,
}

pub type ScopeRef<'p> = Rc<RefCell<Scope<'p>>>;

/// The outcome of an assignment attempt; the evaluator maps these onto thrown
/// error values.
#[derive(Debug)]
pub enum SetError {
  AssignToConst,
  Unresolved,
}

impl<'p> Scope<'p> {
  /// The root scope of one evaluation. It acts as the global function frame.
  pub fn root() -> ScopeRef<'p> {
    Rc::new(RefCell::new(Scope {
      kind: ScopeKind::Function,
      bindings: HashMap::new(),
      parent: None,
    }))
  }

  pub fn child(parent: ScopeRef<'p>, kind: ScopeKind<'p>) -> ScopeRef<'p> {
    Rc::new(RefCell::new(Scope {
      kind,
      bindings: HashMap::new(),
      parent: Some(parent),
    }))
  }

  /// Declares a `var`-mode binding: hoists to the nearest function frame,
  /// keeping any existing value.
  pub fn declare_var(self_: &ScopeRef<'p>, name: &str) {
    let target = Scope::function_frame(self_);
    let mut scope = target.borrow_mut();
    if !scope.bindings.contains_key(name) {
      scope.bindings.insert(name.to_string(), Binding {
        value: Value::Undefined,
        mutable: true,
      });
    }
  }

  /// Declares a lexical (`let`/`const`/parameter/catch) binding in this
  /// frame.
  pub fn declare_lexical(self_: &ScopeRef<'p>, name: &str, mutable: bool, value: Value<'p>) {
    self_
      .borrow_mut()
      .bindings
      .insert(name.to_string(), Binding { value, mutable });
  }

  pub fn get(self_: &ScopeRef<'p>, name: &str) -> Option<Value<'p>> {
    let scope = self_.borrow();
    if let ScopeKind::With(object) = &scope.kind {
      if let Some(value) = with_object_get(object, name) {
        return Some(value);
      }
    }
    if let Some(binding) = scope.bindings.get(name) {
      return Some(binding.value.clone());
    }
    let parent = scope.parent.clone()?;
    drop(scope);
    Scope::get(&parent, name)
  }

  /// Assigns to a resolved binding. Unresolved names create a global `var`
  /// binding in sloppy mode and fail in strict mode.
  pub fn set(
    self_: &ScopeRef<'p>,
    name: &str,
    value: Value<'p>,
    strict: bool,
  ) -> Result<(), SetError> {
    {
      let mut scope = self_.borrow_mut();
      if let ScopeKind::With(object) = &scope.kind {
        let object = object.clone();
        if with_object_set(&object, name, &value) {
          return Ok(());
        }
      }
      if let Some(binding) = scope.bindings.get_mut(name) {
        if !binding.mutable {
          return Err(SetError::AssignToConst);
        }
        binding.value = value;
        return Ok(());
      }
    }
    let parent = self_.borrow().parent.clone();
    match parent {
      Some(parent) => Scope::set(&parent, name, value, strict),
      None => {
        if strict {
          return Err(SetError::Unresolved);
        }
        // Sloppy-mode fallback: create a global binding.
        self_
          .borrow_mut()
          .bindings
          .insert(name.to_string(), Binding {
            value,
            mutable: true,
          });
        Ok(())
      }
    }
  }

  /// Assigns a `var`-mode binding directly in the nearest function frame,
  /// bypassing lexical shadows (e.g. a catch parameter of the same name).
  pub fn set_var(self_: &ScopeRef<'p>, name: &str, value: Value<'p>) {
    let target = Scope::function_frame(self_);
    target
      .borrow_mut()
      .bindings
      .insert(name.to_string(), Binding {
        value,
        mutable: true,
      });
  }

  fn function_frame(self_: &ScopeRef<'p>) -> ScopeRef<'p> {
    let scope = self_.borrow();
    match scope.kind {
      ScopeKind::Function => {
        drop(scope);
        self_.clone()
      }
      _ => {
        let parent = scope
          .parent
          .clone()
          .expect("scope chain must end in a function frame");
        drop(scope);
        Scope::function_frame(&parent)
      }
    }
  }
}

fn with_object_get<'p>(object: &Value<'p>, name: &str) -> Option<Value<'p>> {
  match object {
    Value::Obj(map) => map.borrow().get(name).cloned(),
    Value::Arr(elements) => match name {
      "length" => Some(Value::num(elements.borrow().len() as f64)),
      _ => name
        .parse::<usize>()
        .ok()
        .and_then(|i| elements.borrow().get(i).cloned()),
    },
    _ => None,
  }
}

fn with_object_set<'p>(object: &Value<'p>, name: &str, value: &Value<'p>) -> bool {
  match object {
    Value::Obj(map) => {
      let mut map = map.borrow_mut();
      if map.contains_key(name) {
        map.insert(name.to_string(), value.clone());
        return true;
      }
      false
    }
    Value::Arr(elements) => {
      if let Ok(i) = name.parse::<usize>() {
        let mut elements = elements.borrow_mut();
        if i < elements.len() {
          elements[i] = value.clone();
          return true;
        }
      }
      false
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn var_declarations_hoist_to_function_frame() {
    let root = Scope::root();
    let block = Scope::child(root.clone(), ScopeKind::Block);
    Scope::declare_var(&block, "x");
    assert_eq!(Scope::get(&root, "x"), Some(Value::Undefined));
  }

  #[test]
  fn lexical_bindings_shadow_outer_frames() {
    let root = Scope::root();
    Scope::declare_lexical(&root, "x", true, Value::num(1.0));
    let block = Scope::child(root.clone(), ScopeKind::Block);
    Scope::declare_lexical(&block, "x", true, Value::num(2.0));
    assert_eq!(Scope::get(&block, "x"), Some(Value::num(2.0)));
    assert_eq!(Scope::get(&root, "x"), Some(Value::num(1.0)));
  }

  #[test]
  fn const_bindings_reject_assignment() {
    let root = Scope::root();
    Scope::declare_lexical(&root, "x", false, Value::num(1.0));
    assert!(matches!(
      Scope::set(&root, "x", Value::num(2.0), false),
      Err(SetError::AssignToConst)
    ));
  }

  #[test]
  fn sloppy_set_creates_global_strict_set_fails() {
    let root = Scope::root();
    let block = Scope::child(root.clone(), ScopeKind::Block);
    assert!(Scope::set(&block, "made", Value::num(1.0), false).is_ok());
    assert_eq!(Scope::get(&root, "made"), Some(Value::num(1.0)));
    assert!(matches!(
      Scope::set(&block, "missing", Value::num(1.0), true),
      Err(SetError::Unresolved)
    ));
  }

  #[test]
  fn with_frames_resolve_through_their_object() {
    let root = Scope::root();
    Scope::declare_lexical(&root, "x", true, Value::num(1.0));
    let object = Value::new_obj();
    if let Value::Obj(map) = &object {
      map.borrow_mut().insert("x".to_string(), Value::num(2.0));
    }
    let with = Scope::child(root.clone(), ScopeKind::With(object));
    assert_eq!(Scope::get(&with, "x"), Some(Value::num(2.0)));
    Scope::set(&with, "x", Value::num(3.0), false).unwrap();
    // The object property was updated, not the outer binding.
    assert_eq!(Scope::get(&with, "x"), Some(Value::num(3.0)));
    assert_eq!(Scope::get(&root, "x"), Some(Value::num(1.0)));
  }
}
