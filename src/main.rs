use std::sync::Arc;

use anyhow::Context;
use rmg_chatbot::{
    config::Config,
    logging, routes,
    services::{
        lead_notifier::LeadNotifier, llm::OpenAiClient, retriever::RagRetriever,
        vector_index::VectorIndex,
    },
    state::AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = Config::from_env().context("failed to load configuration")?;

    let index = VectorIndex::load(&config.index_dir).context("failed to load vector index")?;
    let model = Arc::new(OpenAiClient::new(&config.openai));
    let retriever = RagRetriever::new(Arc::new(index), model, config.top_k)
        .context("vector index does not match the configured embedding model")?;

    if config.smtp.host.is_none() {
        warn!("SMTP_HOST is not set; lead emails will be skipped");
    }
    let notifier = LeadNotifier::smtp(config.smtp.clone());

    let state = Arc::new(
        AppState::new(Arc::new(retriever), notifier).with_admin_key(config.admin_key.clone()),
    );
    let app = routes::create_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("🚀 RMG chatbot running at http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
