//! `stackvm` command-line front-end

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use stackvm_assembler::{parse_listing, Assembler};
use stackvm_cli::Session;
use stackvm_disassembler::disassemble;
use stackvm_runtime::{EngineConfig, RunReport};
use stackvm_spec::{InstructionTable, MemoryPolicy};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stackvm", version)]
#[command(about = "Assemble, run and inspect stack VM programs", long_about = None)]
struct Args {
    /// Instruction table file (built-in table when omitted)
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble a source file into an encoded listing
    Assemble {
        source: PathBuf,
        /// Write the listing here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assemble and execute a source file
    Run {
        source: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
        /// Print the step history
        #[arg(long)]
        history: bool,
    },
    /// Disassemble an encoded listing
    Disasm { listing: PathBuf },
    /// Built-in exercises
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Inspect or edit the instruction table
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    List,
    Run {
        id: u32,
        #[command(flatten)]
        machine: MachineArgs,
    },
}

#[derive(Subcommand, Debug)]
enum TableCommand {
    List,
    Add {
        mnemonic: String,
        /// Hex opcode, e.g. `10` or `0x10`
        #[arg(value_parser = opcode_arg)]
        opcode: u8,
    },
    Remove { mnemonic: String },
    Update {
        mnemonic: String,
        #[arg(value_parser = opcode_arg)]
        opcode: u8,
    },
}

#[derive(clap::Args, Debug)]
struct MachineArgs {
    /// Maximum number of steps before the run is stopped
    #[arg(long, default_value_t = stackvm_spec::DEFAULT_STEP_LIMIT)]
    steps: u64,
    /// Memory cells allocated at load time
    #[arg(long, default_value_t = 4096)]
    memory_size: usize,
    /// Maximum stack depth
    #[arg(long, default_value_t = 256)]
    stack_depth: usize,
    /// Let WRITE grow memory instead of faulting
    #[arg(long)]
    grow: bool,
    /// Log every step at info level
    #[arg(long)]
    trace: bool,
}

impl MachineArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        let policy = if self.grow {
            MemoryPolicy::Grow
        } else {
            MemoryPolicy::Fixed
        };
        let machine = stackvm_spec::MachineConfig::new(self.memory_size, self.stack_depth, policy)
            .context("invalid machine configuration")?;
        Ok(EngineConfig {
            machine,
            step_limit: self.steps,
            trace: self.trace,
        })
    }
}

/// Opcodes on the command line are hex, as in table files
fn opcode_arg(text: &str) -> Result<u8, String> {
    stackvm_spec::parse_opcode(text).ok_or_else(|| format!("invalid opcode: {} (expected 00..FF)", text))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_table(path: Option<&Path>) -> Result<InstructionTable> {
    match path {
        Some(path) => InstructionTable::load(path)
            .with_context(|| format!("failed to load table {}", path.display())),
        None => Ok(InstructionTable::builtin()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &RunReport, history: bool) {
    if history {
        for entry in &report.history {
            println!(
                "{:6}  {:<16} pc={:<4} counter={:<4} stack={:?}",
                entry.step, entry.command, entry.pc_after, entry.counter, entry.stack
            );
        }
    }
    println!("steps:   {}", report.steps);
    println!("pc:      {}", report.state.pc);
    println!("counter: {}", report.state.counter);
    println!("stack:   {:?}", report.state.stack);
    match &report.fault {
        Some(fault) if fault.is_execution_error() => println!("fault:   {}", fault),
        Some(fault) => println!("stopped: {}", fault),
        None => println!("halted"),
    }
}

/// Instruction faults fail the command; limits and cancellation do not
fn check_fault(report: &RunReport) -> Result<()> {
    match report.fault.as_ref().filter(|fault| fault.is_execution_error()) {
        Some(fault) => bail!(
            "execution stopped at instruction {}",
            fault.pc().unwrap_or(report.state.pc)
        ),
        None => Ok(()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Assemble { source, output } => {
            let table = load_table(args.table.as_deref())?;
            let assembly = Assembler::new(&table).assemble(&read_source(&source)?);
            for diagnostic in &assembly.diagnostics {
                eprintln!("{}: {}", source.display(), diagnostic);
            }

            if args.json {
                return print_json(&assembly);
            }
            let listing = stackvm_assembler::to_listing(&assembly.encoded);
            match output {
                Some(path) => fs::write(&path, listing)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", listing),
            }
            if !assembly.is_clean() {
                bail!("{} diagnostics", assembly.diagnostics.len());
            }
        }

        Command::Run {
            source,
            machine,
            history,
        } => {
            let table = load_table(args.table.as_deref())?;
            let session = Session::with_table(machine.engine_config()?, table)?;
            let diagnostics = session.load_source(&read_source(&source)?);
            for diagnostic in &diagnostics {
                eprintln!("{}: {}", source.display(), diagnostic);
            }

            let report = session.execute_remaining(machine.steps);
            if args.json {
                print_json(&report)?;
            } else {
                print_report(&report, history);
            }
            check_fault(&report)?;
        }

        Command::Disasm { listing } => {
            let table = load_table(args.table.as_deref())?;
            let encoded = parse_listing(&read_source(&listing)?)
                .with_context(|| format!("malformed listing {}", listing.display()))?;
            print!("{}", disassemble(&encoded, &table)?);
        }

        Command::Task { command } => match command {
            TaskCommand::List => {
                let session = Session::new(EngineConfig::default())?;
                let tasks = session.tasks();
                if args.json {
                    return print_json(&tasks);
                }
                for task in tasks {
                    println!("{:3}  {:<12} {}", task.id, task.name, task.description);
                }
            }
            TaskCommand::Run { id, machine } => {
                let table = load_table(args.table.as_deref())?;
                let session = Session::with_table(machine.engine_config()?, table)?;
                session.load_task(id)?;
                let report = session.execute_remaining(machine.steps);
                let check = session.verify_task(id)?;

                if args.json {
                    print_json(&check)?;
                } else {
                    print_report(&report, false);
                    println!(
                        "task {}: {} (expected {}, got {:?})",
                        id,
                        if check.passed { "PASS" } else { "FAIL" },
                        check.expected,
                        check.actual
                    );
                }
                check_fault(&report)?;
                if !check.passed {
                    bail!("task {} failed", id);
                }
            }
        },

        Command::Table { command } => {
            if let TableCommand::List = command {
                let table = load_table(args.table.as_deref())?;
                if args.json {
                    return print_json(&table.entries());
                }
                print!("{}", table.to_text());
                return Ok(());
            }

            let Some(path) = args.table.as_deref() else {
                bail!("table edits need --table <FILE>");
            };
            let mut table = InstructionTable::open_or_create(path)
                .with_context(|| format!("failed to open table {}", path.display()))?;

            match command {
                TableCommand::Add { mnemonic, opcode } => table.add(&mnemonic, opcode)?,
                TableCommand::Remove { mnemonic } => {
                    table.remove(&mnemonic)?;
                }
                TableCommand::Update { mnemonic, opcode } => table.update(&mnemonic, opcode)?,
                TableCommand::List => {}
            }
            tracing::info!("table {} now has {} entries", path.display(), table.len());
        }
    }

    Ok(())
}
