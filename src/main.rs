mod cli;
mod config;
mod logging;

use colored::Colorize;

fn main() {
    logging::setup_logging();
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        // message verbatim, context chain included
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
