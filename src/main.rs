use memscope::config::InterpreterConfig;
use memscope::diagnostics;
use memscope::interpreter::{ExecError, Interpreter, StepCommand, Stepper, TracingVisualizer};

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use structopt::StructOpt;
use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "MEMSCOPE_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let source = std::fs::read_to_string(&opt.file)?;
    let entry = opt.entry.clone();
    let config = InterpreterConfig::default()
        .with_memory_capacity(opt.memory)
        .with_max_call_depth(opt.max_depth)
        .with_entry_point(opt.entry);

    let mut interpreter = Interpreter::new(config)?.with_visualizer(TracingVisualizer);
    if opt.watch_writes {
        interpreter
            .memory_mut()
            .set_write_callback(Box::new(|address, value| {
                println!("write 0x{:08x} <- {}", address, value)
            }));
    }
    if opt.step {
        let (commands, stepper) = Stepper::new(true);
        interpreter.set_control(Box::new(stepper));
        drive_from_stdin(commands);
    }

    if let Err(error) = interpreter.compile(&source) {
        let report = match error.location() {
            Some(at) => diagnostics::render(&source, at, &error.message()),
            None => error.message(),
        };
        anyhow::bail!("Compilation failed\n{}", report);
    }

    match interpreter.run() {
        Ok(Some(value)) => println!("{} returned {}", entry, value),
        Ok(None) => println!("{} finished", entry),
        Err(ExecError::Aborted) => eprintln!("execution aborted"),
        Err(ExecError::Runtime(error)) => {
            let message = error.to_string();
            let report = match error.location() {
                Some(at) => diagnostics::render(&source, at, &message),
                None => message,
            };
            anyhow::bail!("Runtime error\n{}", report);
        }
    }
    Ok(())
}

/// Enter steps one statement, `c` resumes, `q` aborts
fn drive_from_stdin(commands: Sender<StepCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let command = match line.as_deref().map(str::trim) {
                Ok("q") | Err(_) => StepCommand::Abort,
                Ok("c") => StepCommand::Resume,
                Ok(_) => StepCommand::Step,
            };
            if commands.send(command).is_err() || command == StepCommand::Abort {
                break;
            }
        }
    });
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "memscope",
    about = "Run a C program against an inspectable simulated memory"
)]
struct Opt {
    /// C source file
    #[structopt(parse(from_os_str))]
    file: PathBuf,

    /// Function to start execution from
    #[structopt(long, default_value = "main")]
    entry: String,

    /// Size of the simulated address space in bytes
    #[structopt(long, default_value = "1048576")]
    memory: u32,

    /// Deepest call nesting before a stack overflow is reported
    #[structopt(long = "max-depth", default_value = "512")]
    max_depth: usize,

    /// Print every write to simulated memory
    #[structopt(long = "watch-writes")]
    watch_writes: bool,

    /// Pause before each statement and read commands from stdin
    #[structopt(long)]
    step: bool,
}
