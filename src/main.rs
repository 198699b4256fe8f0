//! smartgpt command-line entry point.

use clap::Parser;

use smartgpt::cli::{Cli, execute};

#[allow(clippy::print_stdout)]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let output = execute(&cli)?;
    if !output.is_empty() {
        print!("{output}");
    }

    Ok(())
}
