use crate::error::Termination;
use crate::error::TerminationReason;
use crate::interrupt::InterruptHandle;
use crate::interrupt::InterruptToken;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// Construction-time VM options.
#[derive(Debug, Clone)]
pub struct VmOptions {
  pub max_stack_depth: usize,
  pub default_fuel: Option<u64>,
  pub default_deadline: Option<Duration>,
  pub check_time_every: u32,
  /// Optional shared interrupt flag to observe for cooperative cancellation.
  ///
  /// If provided, the VM will use this flag for its interrupt token so hosts
  /// can cancel execution by setting the flag to `true`.
  pub interrupt_flag: Option<Arc<AtomicBool>>,
}

impl Default for VmOptions {
  fn default() -> Self {
    Self {
      max_stack_depth: 256,
      default_fuel: None,
      default_deadline: None,
      check_time_every: 100,
      interrupt_flag: None,
    }
  }
}

/// Per-run execution budget.
#[derive(Debug, Clone)]
pub struct Budget {
  pub fuel: Option<u64>,
  pub deadline: Option<Instant>,
  pub check_time_every: u32,
}

impl Budget {
  pub fn unlimited(check_time_every: u32) -> Self {
    Self {
      fuel: None,
      deadline: None,
      check_time_every,
    }
  }
}

#[derive(Debug, Clone)]
struct BudgetState {
  budget: Budget,
  ticks: u64,
}

impl BudgetState {
  fn new(budget: Budget) -> Self {
    Self { budget, ticks: 0 }
  }
}

/// Cooperative execution accounting: fuel, deadline, interrupts, and call
/// depth. One `Vm` belongs to one evaluation; the only cross-thread piece is
/// the interrupt flag.
#[derive(Debug)]
pub struct Vm {
  options: VmOptions,
  interrupt: InterruptToken,
  interrupt_handle: InterruptHandle,
  budget: BudgetState,
  depth: usize,
}

impl Vm {
  pub fn new(options: VmOptions) -> Self {
    let (interrupt, interrupt_handle) = match &options.interrupt_flag {
      Some(flag) => InterruptToken::from_shared_flag(flag.clone()),
      None => InterruptToken::new(),
    };
    let deadline = options
      .default_deadline
      .and_then(|duration| Instant::now().checked_add(duration));
    let budget = Budget {
      fuel: options.default_fuel,
      deadline,
      check_time_every: options.check_time_every,
    };

    Self {
      options,
      interrupt,
      interrupt_handle,
      budget: BudgetState::new(budget),
      depth: 0,
    }
  }

  pub fn interrupt_handle(&self) -> InterruptHandle {
    self.interrupt_handle.clone()
  }

  pub fn set_budget(&mut self, budget: Budget) {
    self.budget = BudgetState::new(budget);
  }

  pub fn enter_frame(&mut self) -> Result<(), Termination> {
    if self.depth >= self.options.max_stack_depth {
      return Err(Termination::new(TerminationReason::StackOverflow));
    }
    self.depth += 1;
    Ok(())
  }

  pub fn exit_frame(&mut self) {
    debug_assert!(self.depth > 0);
    self.depth -= 1;
  }

  /// Consume one VM "tick": checks fuel/deadline/interrupt state.
  pub fn tick(&mut self) -> Result<(), Termination> {
    if let Some(fuel) = &mut self.budget.budget.fuel {
      if *fuel == 0 {
        return Err(Termination::new(TerminationReason::OutOfFuel));
      }
      *fuel -= 1;
    }

    self.budget.ticks = self.budget.ticks.wrapping_add(1);

    if self.interrupt.is_interrupted() {
      return Err(Termination::new(TerminationReason::Interrupted));
    }

    if let Some(deadline) = self.budget.budget.deadline {
      let interval = self.budget.budget.check_time_every.max(1) as u64;
      if self.budget.ticks % interval == 0 && Instant::now() >= deadline {
        return Err(Termination::new(TerminationReason::DeadlineExceeded));
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fuel_runs_out() {
    let mut vm = Vm::new(VmOptions {
      default_fuel: Some(2),
      ..VmOptions::default()
    });
    assert!(vm.tick().is_ok());
    assert!(vm.tick().is_ok());
    let err = vm.tick().unwrap_err();
    assert_eq!(err.reason, TerminationReason::OutOfFuel);
  }

  #[test]
  fn interrupt_flag_terminates() {
    let mut vm = Vm::new(VmOptions::default());
    let handle = vm.interrupt_handle();
    assert!(vm.tick().is_ok());
    handle.interrupt();
    let err = vm.tick().unwrap_err();
    assert_eq!(err.reason, TerminationReason::Interrupted);
  }

  #[test]
  fn stack_depth_is_bounded() {
    let mut vm = Vm::new(VmOptions {
      max_stack_depth: 1,
      ..VmOptions::default()
    });
    vm.enter_frame().unwrap();
    let err = vm.enter_frame().unwrap_err();
    assert_eq!(err.reason, TerminationReason::StackOverflow);
    vm.exit_frame();
  }
}
