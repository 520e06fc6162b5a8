use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        // Site failures carry a stable kind and status for scripts.
        if let Some(site_err) = err.downcast_ref::<novelshelf::error::SiteError>() {
            if let Ok(body) = serde_json::to_string(&site_err.to_body()) {
                eprintln!("{body}");
            }
        }
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    novelshelf::logging::init().context("init logging")?;

    let cli = novelshelf::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let mut stdout = std::io::stdout().lock();
    novelshelf::commands::run(cli.session, cli.command, &mut stdout)
}
