//! Entry-point for the `rentlens` binary.
use clap::Parser;
use rentlens_cli::Cli;
use rentlens_cli::run_main;

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let cli = Cli::parse();
        run_main(cli).await?;
        Ok(())
    })
}
