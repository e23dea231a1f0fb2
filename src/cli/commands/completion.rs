//! completion command - Generate shell completion scripts

use crate::cli::args::{Cli, Shell};
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, shells, Generator};

/// Generate shell completion scripts on stdout.
pub fn completion(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    match shell {
        Shell::Bash => print_completions(shells::Bash, &mut cmd),
        Shell::Zsh => print_completions(shells::Zsh, &mut cmd),
        Shell::Fish => print_completions(shells::Fish, &mut cmd),
        Shell::PowerShell => print_completions(shells::PowerShell, &mut cmd),
    }
    Ok(())
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    let name = cmd.get_name().to_string();
    generate(generator, cmd, name, &mut std::io::stdout());
}
