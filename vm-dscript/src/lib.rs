//! DScript execution engine: the build pass, the optimizer, and the
//! tree-walking evaluator over `parse-dscript` syntax trees.
//!
//! The expected pipeline:
//!
//! ```
//! use vm_dscript::{build_program, optimize_program, Interpreter, OptimizeOptions, Value, VmOptions};
//!
//! let mut program = parse_dscript::parse("let x = 0; do { x = x + 1; } while (x < 3); x").unwrap();
//! let build = build_program(&mut program, diagnostics::FileId(0), &[]);
//! assert!(build.warnings.is_empty());
//! optimize_program(&mut program, &OptimizeOptions::default());
//!
//! let interpreter = Interpreter::new(VmOptions::default());
//! let value = interpreter.exec(&program).unwrap();
//! assert_eq!(value, Value::num(3.0));
//! ```

pub mod build;
pub mod env;
pub mod error;
pub mod exec;
pub mod hoist;
pub mod interrupt;
pub mod ops;
pub mod opt;
pub mod value;
pub mod vm;

pub use crate::build::build_program;
pub use crate::build::BuildOutput;
pub use crate::build::FnStats;
pub use crate::build::VarDescriptor;
pub use crate::error::HostError;
pub use crate::error::Termination;
pub use crate::error::TerminationReason;
pub use crate::error::VmError;
pub use crate::exec::Completion;
pub use crate::exec::Interpreter;
pub use crate::interrupt::InterruptHandle;
pub use crate::interrupt::InterruptToken;
pub use crate::opt::optimize_program;
pub use crate::opt::OptimizeOptions;
pub use crate::opt::PassResult;
pub use crate::value::make_error;
pub use crate::value::NativeCall;
pub use crate::value::Value;
pub use crate::vm::Budget;
pub use crate::vm::Vm;
pub use crate::vm::VmOptions;
