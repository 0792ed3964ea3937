use crate::value::Value;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use thiserror::Error;

/// Why a script run was forcibly terminated by the host boundary. These
/// unwind the native evaluation stack and are never observable by script
/// `catch` blocks.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TerminationReason {
  DeadlineExceeded,
  Interrupted,
  OutOfFuel,
  StackOverflow,
}

impl Display for TerminationReason {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let s = match self {
      TerminationReason::DeadlineExceeded => "deadline exceeded",
      TerminationReason::Interrupted => "interrupted by host",
      TerminationReason::OutOfFuel => "out of fuel",
      TerminationReason::StackOverflow => "stack overflow",
    };
    f.write_str(s)
  }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("script terminated: {reason}")]
pub struct Termination {
  pub reason: TerminationReason,
}

impl Termination {
  pub fn new(reason: TerminationReason) -> Termination {
    Termination { reason }
  }
}

/// An error raised by a host-registered native function. Wrapped exactly once
/// at the native-call boundary into an ordinary thrown error object, so
/// script-level `catch` observes host faults and script throws uniformly.
#[derive(Clone, Debug, Error)]
#[error("{name}: {message}")]
pub struct HostError {
  pub name: String,
  pub message: String,
}

impl HostError {
  pub fn new(name: impl Into<String>, message: impl Into<String>) -> HostError {
    HostError {
      name: name.into(),
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum VmError<'p> {
  /// A script-level thrown value that was never caught.
  #[error("uncaught exception: {0}")]
  Throw(Value<'p>),

  /// Host-boundary termination (interrupt, fuel, deadline, stack overflow).
  #[error(transparent)]
  Termination(#[from] Termination),
}

impl<'p> VmError<'p> {
  /// The thrown value, if this error is an uncaught script exception.
  pub fn thrown_value(&self) -> Option<&Value<'p>> {
    match self {
      VmError::Throw(value) => Some(value),
      _ => None,
    }
  }
}
