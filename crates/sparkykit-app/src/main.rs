use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod demo;

use demo::Cli;

fn main() {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();

    info!("SparkyKit starting");
    if let Err(e) = demo::run(&cli) {
        eprintln!("SparkyKit error: {e}");
        std::process::exit(1);
    }
}
