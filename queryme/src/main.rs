use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cmd;

use clap::Parser;
use common::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_tracing("queryme")?;

    let args = cmd::Cli::parse();
    args.execute().await
}
