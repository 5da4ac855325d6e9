use cf_logs::runtime::{boot, run};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = run::Cli::parse();
    let config = boot::boot(cli.config.as_deref())?;
    run::run(cli.command, config).await
}
