use anyhow::Result;
use tracing::Level;

fn main() -> Result<()> {
    trace2pass_core::init_tracing(false, Level::INFO);

    tracing::info!("trace2passd stub started");
    Ok(())
}
