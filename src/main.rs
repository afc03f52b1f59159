//! TY-16 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ty16-emu run <program>` - Run a .ty image or .asm source
//! - `ty16-emu asm <source>` - Assemble source to a .ty image
//! - `ty16-emu disasm <image>` - Disassemble a .ty image

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ty16-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the TY-16 synthetic 16-bit register machine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ty image or .asm source to execute
        program: String,
        /// Print each instruction as it executes
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Assemble source to a .ty image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble a .ty image to readable text
    Disasm {
        /// Path to the image file
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, trace, json }) => {
            run_program(&program, trace, json);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        None => {
            println!("TY-16 Emulator v0.1.0");
            println!("A synthetic 16-bit register machine");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_sample_program();
        }
    }
}

/// Load a program: assemble `.asm` sources, read anything else as a flat
/// binary image.
fn load_program(path: &str) -> Vec<u8> {
    use ty16::{assemble, load_image};

    if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(code) => {
                println!("📝 Assembled {} bytes", code.len());
                code
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_image(path) {
            Ok(code) => {
                println!("📂 Loaded {} bytes", code.len());
                code
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_program(path: &str, trace: bool, json: bool) {
    use ty16::asm::disasm::disassemble_instruction;
    use ty16::Cpu;

    println!("🔧 Running: {}", path);
    let code = load_program(path);

    let mut cpu = Cpu::new();

    println!();
    println!("━━━ Execution ━━━");

    while cpu.is_running() {
        let at = cpu.offset();
        match cpu.step(&code) {
            Ok(Some(instr)) => {
                if trace {
                    println!("{:04X}: {}", at, disassemble_instruction(&instr));
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("❌ CPU fault: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State: {:?}", cpu.state);
    println!();

    if json {
        let summary = serde_json::json!({
            "state": cpu.state,
            "cycles": cpu.cycles,
            "registers": cpu.regs,
        });
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    } else {
        print!("{}", cpu.regs);
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use ty16::{assemble, save_image};

    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".ty"));

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let code = match assemble(&source) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} bytes", code.len());

    if let Err(e) = save_image(&out_path, &code) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(path: &str) {
    use ty16::{disassemble, load_image};

    println!("📖 Disassembling: {}", path);
    println!();

    let code = match load_image(path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    print!("{}", disassemble(&code));
}

fn demo_sample_program() {
    use ty16::{assemble, Cpu};

    println!("━━━ Sample Program ━━━");
    println!();

    let source = r#"
        MOVI 1200, R2
        MOVI 34, R3
        ADDR R3, R2     ; R2 = 1234
        DIVI 100, R2    ; R0 = 12, R1 = 34
        EXIT
    "#;

    for line in source.lines().filter(|l| !l.trim().is_empty()) {
        println!("  {}", line.trim());
    }
    println!();

    let code = assemble(source).expect("sample program assembles");
    let mut cpu = Cpu::new();
    let executed = cpu.run(&code).expect("sample program runs");

    println!("Executed {} instructions from {} bytes", executed, code.len());
    println!();
    print!("{}", cpu.regs);
}
