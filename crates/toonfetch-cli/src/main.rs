mod cli;
mod logging;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    logging::init_logging();

    let cli = Cli::parse();
    if let Err(err) = cli.run().await {
        eprintln!("toonfetch error: {:#}", err);
        std::process::exit(1);
    }
}
