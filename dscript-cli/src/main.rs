use clap::Parser;
use diagnostics::host_error;
use diagnostics::render::render_diagnostic;
use diagnostics::render::SourceProvider;
use diagnostics::FileId;
use diagnostics::Severity;
use std::fs::File;
use std::io::stdin;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;
use std::time::Duration;
use vm_dscript::build_program;
use vm_dscript::optimize_program;
use vm_dscript::HostError;
use vm_dscript::Interpreter;
use vm_dscript::NativeCall;
use vm_dscript::OptimizeOptions;
use vm_dscript::Value;
use vm_dscript::VmError;
use vm_dscript::VmOptions;

#[derive(Parser)]
#[command(name = "dscript", about = "Run a DScript program")]
struct Cli {
  /// Script to run; omit for stdin.
  input: Option<PathBuf>,

  /// Print the parsed syntax tree as JSON instead of executing.
  #[arg(long)]
  print_ast: bool,

  /// Suppress build-pass warnings (unresolved names).
  #[arg(long)]
  no_build_warnings: bool,

  /// Collapse loops with provably-constant conditions (optional optimizer
  /// pass).
  #[arg(long)]
  collapse_loops: bool,

  /// Abort execution after this many evaluation steps.
  #[arg(long)]
  fuel: Option<u64>,

  /// Abort execution after this many milliseconds.
  #[arg(long)]
  timeout_ms: Option<u64>,

  /// Maximum script call depth.
  #[arg(long, default_value_t = 256)]
  max_stack_depth: usize,
}

struct SingleFileSource<'a> {
  name: String,
  text: &'a str,
}

impl<'a> SourceProvider for SingleFileSource<'a> {
  fn file_name(&self, _file: FileId) -> Option<&str> {
    Some(&self.name)
  }

  fn file_text(&self, _file: FileId) -> Option<&str> {
    Some(self.text)
  }
}

fn exit_with_host_error(name: &str, text: &str, message: impl Into<String>) -> ! {
  let diagnostic = host_error(None, message.into());
  let provider = SingleFileSource {
    name: name.to_string(),
    text,
  };
  eprintln!("{}", render_diagnostic(&provider, &diagnostic));
  process::exit(1);
}

/// Host-provided output: `print(...)` writes its arguments to stdout.
struct Print;

impl NativeCall for Print {
  fn call<'p>(&self, args: &[Value<'p>]) -> Result<Value<'p>, HostError> {
    let line = args
      .iter()
      .map(|v| v.to_string())
      .collect::<Vec<_>>()
      .join(" ");
    println!("{}", line);
    Ok(Value::Undefined)
  }
}

fn main() {
  let args = Cli::parse();
  let input_name = args
    .input
    .as_ref()
    .map(|p| p.to_string_lossy().into_owned())
    .unwrap_or_else(|| "<stdin>".to_string());
  let mut input = Vec::new();
  let mut input_file: Box<dyn Read> = match args.input.as_ref() {
    Some(p) => match File::open(p) {
      Ok(f) => Box::new(f),
      Err(err) => {
        exit_with_host_error(&input_name, "", format!("failed to open {}: {err}", p.display()));
      }
    },
    None => Box::new(stdin()),
  };
  if let Err(err) = input_file.read_to_end(&mut input) {
    exit_with_host_error(&input_name, "", format!("failed to read input: {err}"));
  }
  let source = match std::str::from_utf8(&input) {
    Ok(source) => source,
    Err(err) => {
      exit_with_host_error(&input_name, "", format!("input is not valid UTF-8: {err}"));
    }
  };
  let provider = SingleFileSource {
    name: input_name.clone(),
    text: source,
  };

  let file = FileId(0);
  let mut had_error = false;
  let parsed = parse_dscript::parse_with_diagnostics(source, file, &mut |diagnostic| {
    if diagnostic.severity == Severity::Error {
      had_error = true;
    }
    eprintln!("{}", render_diagnostic(&provider, diagnostic));
  });
  let mut program = match parsed {
    Ok(program) => program,
    Err(_) => process::exit(1),
  };
  if had_error {
    process::exit(1);
  }

  if args.print_ast {
    match serde_json::to_string_pretty(&program) {
      Ok(json) => println!("{}", json),
      Err(err) => exit_with_host_error(&input_name, source, format!("failed to serialize: {err}")),
    }
    return;
  }

  let mut interpreter = Interpreter::new(VmOptions {
    max_stack_depth: args.max_stack_depth,
    default_fuel: args.fuel,
    default_deadline: args.timeout_ms.map(Duration::from_millis),
    ..VmOptions::default()
  });
  interpreter.register_native("print", Rc::new(Print));

  let ambient = interpreter.native_names();
  let build = build_program(&mut program, file, &ambient);
  if !args.no_build_warnings {
    for diagnostic in &build.warnings {
      eprintln!("{}", render_diagnostic(&provider, diagnostic));
    }
  }

  optimize_program(&mut program, &OptimizeOptions {
    collapse_constant_loops: args.collapse_loops,
  });

  match interpreter.exec(&program) {
    Ok(value) => {
      if !matches!(value, Value::Undefined) {
        println!("{:?}", value);
      }
    }
    Err(VmError::Throw(value)) => {
      eprintln!("uncaught exception: {:?}", value);
      process::exit(1);
    }
    Err(err) => {
      eprintln!("{}", err);
      process::exit(2);
    }
  };
}
