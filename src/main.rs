// kver - Main entry point
use clap::Parser;
use kver::cli::Cli;
use std::process;

fn main() {
    let cli = Cli::parse();
    let use_colors = cli.log_config().should_use_colors();

    let exit_code = match cli.run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.user_message(use_colors));
            e.exit_code()
        }
    };

    process::exit(exit_code);
}
