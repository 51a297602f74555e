use anyhow::Result;
use clap::Parser;
use pokerbank::cli::Cli;
use pokerbank::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    cli.run().await
}
