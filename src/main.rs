// Copyright (c) 2024 Vivek Poovathoor
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// main.rs
//
// Command-line entry point: reads an instruction file, runs it to
// completion on a default-configured Machine, and prints the per-cycle
// table followed by the final register dump. Ctrl-C requests a graceful
// stop at the next cycle boundary rather than an abrupt process kill.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use tomasulo_rust::config::Config;
use tomasulo_rust::machine::Machine;
use tomasulo_rust::reader::{self, DEFAULT_INPUT_FILENAME};
use tomasulo_rust::reporter;
use tomasulo_rust::SimulatorError;

#[derive(Parser)]
#[command(name = "tomasulo_rust")]
#[command(about = "A cycle-accurate simulator of Tomasulo's dynamic scheduling algorithm")]
#[command(version)]
struct Cli {
    /// Path to the instruction stream to simulate.
    #[arg(default_value = DEFAULT_INPUT_FILENAME)]
    instruction_file: PathBuf,
}

fn run(path: &PathBuf, keep_running: &AtomicBool) -> Result<(), SimulatorError> {
    let config = Config::default();
    let file = File::open(path)?;
    let instructions = reader::read_instructions(BufReader::new(file), &config)?;
    log::info!("parsed {} instructions from {}", instructions.len(), path.display());

    let mut machine = Machine::new(config);
    let outcome = machine.run(instructions, Some(keep_running), |table, cycle| {
        print!("{}", reporter::render_cycle(table, cycle));
    })?;

    if outcome.interrupted {
        println!("\nSimulator abruptly interrupted. Exiting...");
    }
    print!("{}", reporter::render_summary(&outcome.table, outcome.cycles, &outcome.register_values));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let keep_running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&keep_running);
    if let Err(err) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    }) {
        log::warn!("failed to install Ctrl-C handler: {}", err);
    }

    match run(&cli.instruction_file, &keep_running) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
    }
}
