mod cli;
mod core;
mod driver;
mod editor;
mod logging;
mod tui;

use clap::Parser;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    if cli.tui {
        if let Some(path) = &cli.log_file {
            if let Err(err) = logging::init_file(path, cli.verbose) {
                eprintln!("{err}");
                std::process::exit(1);
            }
        }
        if let Err(err) = tui::run(&cli) {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return;
    }

    logging::init_stderr(cli.verbose);
    match driver::run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
}
