//! tritvm - CLI Entry Point
//!
//! Commands:
//! - `tritvm run <program>` - Run a ternary or assembly program
//! - `tritvm debug <program>` - Interactive debugger
//! - `tritvm asm <source>` - Assemble to ternary program text
//! - `tritvm disasm <program>` - Disassemble ternary program text
//! - `tritvm encode <n>...` / `tritvm decode <tok>...` - Numeral conversion

use std::path::Path;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tritvm::{
    assemble, disassemble, from_balanced_ternary, to_balanced_ternary, to_program_text,
    ConditionalBreakpoint, MemorySize, StepOutcome, Vm, VmConfig, Watch,
};
use tritvm::vm::parse_program;

#[derive(Parser)]
#[command(name = "tritvm")]
#[command(version)]
#[command(about = "A balanced ternary virtual machine with a step-back debugger")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands that build a VM.
#[derive(Args)]
struct MachineArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<String>,
    /// Memory size in words (27, 81 or 243)
    #[arg(short, long)]
    memory_size: Option<usize>,
    /// Maximum number of instructions before the run is stopped
    #[arg(long)]
    max_instructions: Option<u64>,
    /// Treat the program as assembly source even without a .asm extension
    #[arg(long)]
    asm: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the ternary (or .asm) program
        program: String,
        #[command(flatten)]
        machine: MachineArgs,
        /// Pause at an address (repeatable); the run continues after reporting
        #[arg(short, long = "break")]
        breakpoints: Vec<usize>,
        /// Conditional breakpoint such as "acc >= 5" (repeatable)
        #[arg(long)]
        when: Vec<String>,
        /// Watch expression such as "mem[3] as total" (repeatable)
        #[arg(short, long)]
        watch: Vec<String>,
        /// Write-protect an address (repeatable)
        #[arg(long)]
        protect: Vec<usize>,
        /// Count loads and stores per address and print the hottest cells
        #[arg(long)]
        heatmap: bool,
        /// Delay between steps in milliseconds
        #[arg(long, default_value = "0")]
        delay_ms: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the ternary (or .asm) program
        program: String,
        #[command(flatten)]
        machine: MachineArgs,
        /// Milliseconds between steps while running
        #[arg(long, default_value = "50")]
        tick_ms: u64,
    },
    /// Assemble source to ternary program text
    Asm {
        /// Path to the source file
        source: String,
        /// Output file (default: source with a .tern extension)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble ternary program text
    Disasm {
        /// Path to the program
        program: String,
    },
    /// Convert integers to balanced ternary
    Encode {
        #[arg(allow_hyphen_values = true, required = true)]
        values: Vec<i64>,
    },
    /// Convert balanced ternary to integers
    Decode {
        #[arg(allow_hyphen_values = true, required = true)]
        tokens: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    init_logging(trace);

    match cli.command {
        Some(Commands::Run {
            program, machine, breakpoints, when, watch, protect, heatmap, delay_ms, trace, json,
        }) => {
            let mut vm = build_vm(&program, &machine);
            if heatmap {
                vm.set_heatmap_enabled(true);
            }
            for addr in breakpoints {
                vm.debug_mut().breakpoints.add(addr);
            }
            for expr in when {
                let condition: ConditionalBreakpoint = expr.parse().unwrap_or_else(|e| fail(e));
                vm.debug_mut().breakpoints.add_condition(condition);
            }
            for expr in watch {
                let watch: Watch = expr.parse().unwrap_or_else(|e| fail(e));
                vm.debug_mut().watches.add(watch);
            }
            for addr in protect {
                vm.memory_mut().protect(addr).unwrap_or_else(|e| fail(e));
            }
            run_program(vm, Duration::from_millis(delay_ms), trace, json);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program, machine, tick_ms }) => {
            let config = build_config(&machine);
            let words = read_program(&program, machine.asm);
            println!("🚀 Launching debugger...");
            if let Err(e) = tritvm::run_debugger(words, config, Duration::from_millis(tick_ms)) {
                fail(format!("Debugger error: {}", e));
            }
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { program }) => {
            let words = read_program(&program, false);
            println!("{}", disassemble(&words));
        }
        Some(Commands::Encode { values }) => {
            for value in values {
                println!("{:>20} = {}", value, to_balanced_ternary(value));
            }
        }
        Some(Commands::Decode { tokens }) => {
            for token in tokens {
                match from_balanced_ternary(&token) {
                    Ok(value) => println!("{:>20} = {}", token, value),
                    Err(e) => fail(e),
                }
            }
        }
        None => {
            println!("tritvm v{}", env!("CARGO_PKG_VERSION"));
            println!("A balanced ternary virtual machine");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; `--trace` raises the default to per-step output.
fn init_logging(trace: bool) {
    let default = if trace { "tritvm=trace" } else { "tritvm=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

fn build_config(machine: &MachineArgs) -> VmConfig {
    let mut config = match &machine.config {
        Some(path) => VmConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => VmConfig::default(),
    };
    if let Some(words) = machine.memory_size {
        config.memory_size = MemorySize::try_from(words).unwrap_or_else(|e| fail(e));
    }
    if let Some(max) = machine.max_instructions {
        config.max_instructions = max;
    }
    config
}

/// Read a program file as memory words, assembling `.asm` sources.
fn read_program(path: &str, force_asm: bool) -> Vec<i64> {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path, e)));

    let is_asm = force_asm || Path::new(path).extension().is_some_and(|ext| ext == "asm");
    if is_asm {
        assemble(&text).unwrap_or_else(|e| fail(format!("Assembly error: {}", e)))
    } else {
        parse_program(&text).unwrap_or_else(|e| fail(format!("Load error: {}", e)))
    }
}

fn build_vm(path: &str, machine: &MachineArgs) -> Vm {
    let config = build_config(machine);
    let words = read_program(path, machine.asm);
    let mut vm = Vm::with_config(config);
    let loaded = vm.load_words(&words);
    println!("📂 Loaded {} words into {}-word memory", loaded, vm.memory().len());
    vm
}

fn run_program(mut vm: Vm, delay: Duration, trace: bool, json: bool) {
    use tritvm::asm::disasm::disassemble_at;

    println!();
    println!("━━━ Execution ━━━");

    let mut failed = false;
    loop {
        let pc = vm.pc();
        let text = disassemble_at(vm.memory().cells(), pc).0;

        match vm.step() {
            Ok(StepOutcome::Continue) => {
                if trace {
                    println!("{:03}: {:<12} ACC={}", pc, text, vm.accumulator());
                }
            }
            Ok(StepOutcome::Halted(reason)) if reason.is_breakpoint() => {
                println!("⏸  {} (PC={:03}, ACC={})", reason, vm.pc(), vm.accumulator());
                for value in vm.watch_values() {
                    println!("     {}", value);
                }
            }
            Ok(StepOutcome::Halted(reason)) => {
                println!("■ {}", reason);
                break;
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={:03}: {}", pc, e);
                failed = true;
                break;
            }
        }

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", vm.instruction_count());
    println!("State: {:?}", vm.state());
    println!("ACC:   {} ({})", to_balanced_ternary(vm.accumulator()), vm.accumulator());
    println!("PC:    {:03}", vm.pc());
    for value in vm.watch_values() {
        println!("Watch: {}", value);
    }

    if vm.memory().is_tracking() {
        let mut hot: Vec<(usize, u64)> = vm
            .memory()
            .access_counts()
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, n)| n > 0)
            .collect();
        hot.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        for (addr, hits) in hot.into_iter().take(5) {
            println!("Hot:   {:03} ({} accesses)", addr, hits);
        }
    }

    if json {
        println!("{}", vm.snapshot().to_json_pretty());
    }

    if failed {
        std::process::exit(1);
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path).with_extension("tern").display().to_string()
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let words = read_program(source_path, true);
    println!("✓ Assembled {} words", words.len());

    if let Err(e) = std::fs::write(&out_path, to_program_text(&words) + "\n") {
        fail(format!("Failed to write {}: {}", out_path, e));
    }

    println!("✓ Saved to {}", out_path);
}
