use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rag_engine::{Metadata, MetadataValue};

/// Query and maintain a retrieval-augmented knowledge base.
#[derive(Parser, Debug, Clone)]
#[command(name = "rag", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Snapshot file backing the document store.
    #[arg(global = true, long, env = "RAG_SNAPSHOT", default_value = "rag_database.json")]
    pub snapshot: PathBuf,

    /// Number of documents retrieved as context.
    #[arg(global = true, long, env = "RAG_TOP_K", default_value_t = 3)]
    pub top_k: usize,

    /// Language answers are written in.
    #[arg(global = true, long, env = "RAG_LANGUAGE", default_value = "Thai")]
    pub language: String,

    /// Remote embedding backend, ignored with --offline.
    #[arg(global = true, long, env = "RAG_EMBEDDER", value_enum, default_value_t = Embedder::Gemini)]
    pub embedder: Embedder,

    /// Requested embedding width for OpenAI `text-embedding-3-*` models.
    #[cfg(feature = "openai")]
    #[arg(global = true, long, env = "RAG_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Embed locally with the hashing model; generation is unavailable.
    #[arg(global = true, long, default_value_t = false)]
    pub offline: bool,

    /// Emit logs as JSON lines.
    #[arg(global = true, long, default_value_t = false)]
    pub log_json: bool,
}

/// Embedding backends reachable over HTTP.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embedder {
    /// Gemini `text-embedding-004`, sharing the generation API key.
    Gemini,
    /// OpenAI `/v1/embeddings`, keyed by `OPENAI_API_KEY`.
    #[cfg(feature = "openai")]
    #[value(name = "openai")]
    OpenAi,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Append one document.
    Add {
        /// Document text.
        text: String,
        /// Metadata entry, repeatable.
        #[arg(long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta_entry)]
        meta: Vec<(String, MetadataValue)>,
    },
    /// Load the built-in sample corpus.
    Seed,
    /// Print the documents nearest to a query, with distances.
    Search {
        query: String,
        /// Number of results (defaults to --top-k).
        #[arg(short = 'k', long = "limit")]
        k: Option<usize>,
    },
    /// Answer a question with retrieved context.
    Ask {
        query: String,
        /// Also print the prompt sent to the model.
        #[arg(long, default_value_t = false)]
        show_prompt: bool,
    },
    /// Answer a question about an image.
    Image {
        path: PathBuf,
        #[arg(long, default_value = "อธิบายภาพนี้ให้ละเอียด")]
        query: String,
        /// Skip knowledge-base retrieval.
        #[arg(long, default_value_t = false)]
        no_rag: bool,
    },
    /// Remove every document.
    Clear,
    /// Print store statistics.
    Stats,
}

/// Parse `key=value`; `true`/`false` become booleans and numeric values numbers.
pub fn parse_meta_entry(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in `{raw}`"));
    }

    let value = match value {
        "true" => MetadataValue::Bool(true),
        "false" => MetadataValue::Bool(false),
        other => match other.parse::<f64>() {
            Ok(number) if number.is_finite() => MetadataValue::Number(number),
            _ => MetadataValue::String(other.to_string()),
        },
    };
    Ok((key.to_string(), value))
}

pub fn into_metadata(entries: Vec<(String, MetadataValue)>) -> Metadata {
    entries.into_iter().collect()
}
