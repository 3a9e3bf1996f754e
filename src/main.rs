use anyhow::{Context, Result};
use ncovscraper::{report, snapshot, Config};
use std::{env, path::PathBuf, process::exit};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Usage: ncovscraper [--json] [CONFIG.yaml]";

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args ─────────────────────────────────────────────────────
    let mut as_json = false;
    let mut config_path: Option<PathBuf> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => as_json = true,
            "-h" | "--help" => {
                eprintln!("{}", USAGE);
                exit(0);
            }
            other if config_path.is_none() => config_path = Some(PathBuf::from(other)),
            other => {
                eprintln!("unexpected argument `{}`\n{}", other, USAGE);
                exit(2);
            }
        }
    }

    // ─── 3) load config ──────────────────────────────────────────────
    let config = Config::load(config_path.as_deref()).context("loading configuration")?;
    info!(endpoint = %config.fetch.endpoint, labels = ?config.labels, "startup");

    // ─── 4) fetch + reshape ──────────────────────────────────────────
    let snap = snapshot(&config).await.context("building snapshot")?;
    if snap.omission_count() > 0 {
        warn!(omitted = snap.omission_count(), "some rows were omitted");
    }

    // ─── 5) print ────────────────────────────────────────────────────
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report::render_json(&snap))?);
    } else {
        print!("{}", report::render_text(&snap).context("rendering tables")?);
    }
    Ok(())
}
