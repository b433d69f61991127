//! Offline index build: `build-index --policy policy.txt --out vector_index`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rmg_chatbot::{
    config::Config,
    logging,
    services::{
        index_builder::build_index_from_file,
        llm::OpenAiClient,
        text_splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextSplitter},
    },
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "build-index", about = "Embed the policy document into a vector index")]
struct Args {
    /// Plain-text policy document to index.
    #[arg(long, default_value = "policy.txt")]
    policy: PathBuf,

    /// Output directory; defaults to INDEX_DIR.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let args = Args::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let out = args.out.unwrap_or_else(|| config.index_dir.clone());

    let splitter = TextSplitter::new(args.chunk_size, args.chunk_overlap)?;
    let model = OpenAiClient::new(&config.openai);

    let index = build_index_from_file(&args.policy, &out, &splitter, &model)
        .await
        .with_context(|| format!("failed to index {}", args.policy.display()))?;

    info!("✅ {} chunks written to {}", index.len(), out.display());
    Ok(())
}
