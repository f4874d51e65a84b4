//! Runs one opportunity search from the command line and prints progress and results.
//!
//! Usage: `search_demo <term...>`. The key comes from the settings file, then `config/ai.json`, then `OPENAI_API_KEY`.

use std::sync::Arc;

use freelance_radar::aggregate::{Aggregator, SearchOutcome, NO_RESULTS_MESSAGE};
use freelance_radar::config::{ai::DEFAULT_AI_CONFIG_PATH, load_registries_default, OracleConfig};
use freelance_radar::feed::http::HttpFeedFetcher;
use freelance_radar::oracle::{OpenAiProvider, Oracle};
use freelance_radar::probe::HttpProber;
use freelance_radar::settings::SettingsStore;
use freelance_radar::sources::SourceProgress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    freelance_radar::init_tracing();

    let term = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if term.trim().is_empty() {
        anyhow::bail!("usage: search_demo <search term>");
    }

    let ai_cfg = OracleConfig::load_or_default(DEFAULT_AI_CONFIG_PATH);
    let registries = load_registries_default()?;
    let key = SettingsStore::open_default()
        .get()
        .api_key()
        .map(str::to_string)
        .or_else(|| Some(ai_cfg.api_key.clone()).filter(|k| !k.trim().is_empty()))
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());

    let aggregator = Aggregator::new(
        Arc::new(registries.opportunities),
        Arc::new(HttpFeedFetcher::new()?),
        Arc::new(HttpProber::new()?),
        Arc::new(Oracle::new(Arc::new(OpenAiProvider::new(&ai_cfg)?))),
    );

    let (tx, mut rx) = tokio::sync::watch::channel(Vec::<SourceProgress>::new());
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let line = rx
                .borrow_and_update()
                .iter()
                .map(|p| format!("{}={:?}", p.name, p.status))
                .collect::<Vec<_>>()
                .join(" ");
            println!("progress: {line}");
        }
    });

    let report = aggregator.search(&term, key.as_deref(), &tx).await?;
    drop(tx);
    let _ = printer.await;

    match report.outcome {
        SearchOutcome::Found(items) => {
            for item in items {
                println!("{}", serde_json::to_string(&item)?);
            }
        }
        SearchOutcome::NoResults => println!("{NO_RESULTS_MESSAGE}"),
    }
    Ok(())
}
