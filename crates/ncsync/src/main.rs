mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;
mod progress;

use clap::Parser;

use ncsync_core::Mode;

use crate::cli::{Cli, Command};
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Device commands set up their own file logging once config is known
        Command::Run(ref args) => commands::reconcile::handle(Mode::Reconcile, args, &cli.global),
        Command::Backup(ref args) => {
            commands::reconcile::handle(Mode::BackupOnly, args, &cli.global)
        }
        Command::Status(ref args) => {
            commands::reconcile::handle(Mode::StatusOnly, args, &cli.global)
        }

        Command::Config(args) => {
            let _guard = logging::init(cli.global.verbose, None)?;
            commands::config_cmd::handle(args, &cli.global)
        }

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ncsync", &mut std::io::stdout());
            Ok(())
        }
    }
}
