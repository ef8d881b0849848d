//! Shell completions command

use clap::CommandFactory;
use clap_complete::Shell;

use crate::Cli;

/// Generate shell completions on stdout.
pub fn completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
