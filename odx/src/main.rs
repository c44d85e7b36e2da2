use clap::Parser;
use tracing_subscriber::EnvFilter;

use odx::cli::{Cli, run};

fn main() {
    // Logs go to stderr so stdout stays clean for stage output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
