use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset. html5ever and selectors log every tree
/// builder recovery at debug, which drowns out adapter logs.
const DEFAULT_FILTER: &str = "info,html5ever=warn,selectors=warn";

pub fn init() -> anyhow::Result<()> {
    let filter = filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())?;

    // Stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

/// An unset or blank `RUST_LOG` falls back to [`DEFAULT_FILTER`]; a malformed
/// one is an error rather than a silent fallback.
fn filter_from(directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    match directives.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => EnvFilter::try_new(raw).with_context(|| format!("invalid RUST_LOG={raw:?}")),
        None => EnvFilter::try_new(DEFAULT_FILTER).context("build default log filter"),
    }
}
