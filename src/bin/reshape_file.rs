use anyhow::{Context, Result};
use ncovscraper::{fetch::unwrap_envelope, report, Config, Snapshot};
use std::{env, fs, path::Path, process::exit};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Reshape a saved `disease_h5` response body instead of fetching one.
/// Labels come from `NCOV_LABELS` (english | chinese).
fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let (as_json, path) = match args.as_slice() {
        [_, flag, path] if flag == "--json" => (true, path),
        [_, path] => (false, path),
        _ => {
            eprintln!("Usage: {} [--json] <PAYLOAD_FILE>", args[0]);
            exit(1);
        }
    };

    let config = Config::load(None).context("loading configuration")?;
    let body = fs::read_to_string(Path::new(path)).with_context(|| format!("reading {}", path))?;
    let raw = unwrap_envelope(&body).with_context(|| format!("unwrapping {}", path))?;
    let snap = Snapshot::from_raw(&raw, config.labels.dictionary())
        .with_context(|| format!("reshaping {}", path))?;
    info!(
        update_time = %snap.update_time(),
        omitted = snap.omission_count(),
        "reshaped {}",
        path
    );

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report::render_json(&snap))?);
    } else {
        print!("{}", report::render_text(&snap).context("rendering tables")?);
    }
    Ok(())
}
