//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tilebundle_cli::CliError;

fn main() {
    env_logger::init();
    if let Err(err) = tilebundle_cli::run() {
        if let CliError::ArgumentParsing(parse) = &err {
            parse.exit();
        }
        eprintln!("tilebundle: {err}");
        std::process::exit(err.exit_code());
    }
}
