mod args;
mod commands;
mod logging;

use clap::Parser;
use tracing::Level;

use crate::args::Args;
use crate::logging::LogWriter;

fn main() {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(level)
        .init();

    match commands::run(&args) {
        Ok(output) => {
            let text = serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string());
            println!("{text}");
        }
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
}
