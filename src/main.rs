use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base = std::env::args()
        .nth(1)
        .context("usage: fundamental-scout <stock-page-url>")?;

    let report = fundamental_scout::run(&base).await?;
    if let Some(hint) = report.fcf_growth_hint {
        tracing::info!(hint, "suggested fcf growth rate");
    }
    print!("{}", report.flat_text);
    Ok(())
}
