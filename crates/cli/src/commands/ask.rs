//! `kurort ask` — Run one advisory request end to end.

use std::sync::Arc;

use anyhow::{Context, bail};

use kurort_advisor::Advisor;
use kurort_config::AppConfig;
use kurort_core::TextEmbedder;
use kurort_embedding::{ApiEmbedder, EmbeddingCache, EmbeddingService};
use kurort_llm::{ContextBudget, HfTokenCounter, OpenAiClient};
use kurort_sources::WikiSource;

pub async fn run(message: &str, json: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    KURORT_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("no API key found");
    }
    let api_key = config.api_key.clone().unwrap_or_default();

    let llm = Arc::new(OpenAiClient::new(
        config.llm.api_url.as_str(),
        api_key.as_str(),
        config.llm.model.as_str(),
    )?);

    // The tokenizer download hits the network and the disk cache
    let repo = config.llm.tokenizer_repo().to_string();
    let counter = tokio::task::spawn_blocking(move || HfTokenCounter::from_pretrained(&repo))
        .await
        .context("tokenizer load task")??;
    let budget = ContextBudget::new(Arc::new(counter));

    let embedder: Arc<dyn TextEmbedder> = match config.embedding.backend.as_str() {
        "api" => Arc::new(ApiEmbedder::new(
            config.embedding_api_url(),
            api_key.as_str(),
            config.embedding.model.as_str(),
        )?),
        "local" => local_embedder(&config)?,
        other => bail!("unknown embedding backend {other:?}"),
    };
    let cache = EmbeddingCache::open(config.embedding_cache_path());
    let embeddings = EmbeddingService::new(embedder, cache);

    let wiki = Arc::new(WikiSource::new(None)?);
    let advisor = Advisor::new(wiki, llm, embeddings, budget, config.cities.clone());

    let recommendation = advisor.process_request(message).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
        return Ok(());
    }

    println!("Предпочтения:");
    println!("{}", recommendation.preferences.trim());
    if let Some((activity, confidence)) = recommendation.activity {
        println!("\nАктивность: {activity} ({confidence:.2})");
    }
    if let Some(season) = recommendation.season {
        println!("Сезон: {season}");
    }
    println!("\nТоп города:");
    for city in &recommendation.ranked {
        println!("  {}  (score {:.3})", city.name, city.score);
    }
    println!("\n{}", recommendation.answer.trim());
    Ok(())
}

#[cfg(feature = "local")]
fn local_embedder(config: &AppConfig) -> anyhow::Result<Arc<dyn TextEmbedder>> {
    Ok(Arc::new(kurort_embedding::BertEmbedder::new(Some(&config.embedding.model))))
}

#[cfg(not(feature = "local"))]
fn local_embedder(_config: &AppConfig) -> anyhow::Result<Arc<dyn TextEmbedder>> {
    bail!("embedding backend \"local\" requires a build with the `local` feature")
}
