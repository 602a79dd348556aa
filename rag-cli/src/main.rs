mod cli;
mod corpus;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rag_engine::gemini::GeminiClient;
#[cfg(feature = "openai")]
use rag_engine::openai::OpenAIEmbeddingProvider;
use rag_engine::{
    EmbeddingProvider, GenerationClient, HashingEmbeddingProvider, ImageInput, Metadata,
    PromptComposer, QueryFailure, RagConfig, Retriever,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Embedder, GlobalOpts, into_metadata};
use crate::corpus::SAMPLE_DOCUMENTS;

/// Embedding and generation backends chosen for this run.
struct Backends {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Option<Arc<dyn GenerationClient>>,
}

impl Backends {
    fn select(global: &GlobalOpts) -> Result<Self> {
        if global.offline {
            info!("offline mode: hashing embeddings, generation disabled");
            return Ok(Self {
                embedder: Arc::new(HashingEmbeddingProvider::default()),
                generator: None,
            });
        }
        let gemini = GeminiClient::from_env();
        let embedder: Arc<dyn EmbeddingProvider> = match global.embedder {
            Embedder::Gemini => match &gemini {
                Ok(client) => Arc::new(client.embedding_provider()),
                Err(e) => bail!("{e}; set GEMINI_API_KEY or pass --offline"),
            },
            #[cfg(feature = "openai")]
            Embedder::OpenAi => {
                let provider = OpenAIEmbeddingProvider::from_env()
                    .context("set OPENAI_API_KEY or pick another --embedder")?;
                Arc::new(with_requested_width(provider, global.embedding_dimensions))
            }
        };

        let generator = match gemini {
            Ok(client) => Some(Arc::new(client) as Arc<dyn GenerationClient>),
            Err(e) => {
                warn!(error = %e, "generation disabled");
                None
            }
        };
        info!(embedder = embedder.name(), dimensions = embedder.dimensions(), "backends selected");
        Ok(Self { embedder, generator })
    }

    fn composer(self, retriever: Arc<Retriever>, config: RagConfig) -> Result<PromptComposer> {
        let Some(generator) = self.generator else {
            bail!("this command needs a generation backend; set GEMINI_API_KEY and run without --offline");
        };
        Ok(PromptComposer::new(retriever, generator, config))
    }
}

#[cfg(feature = "openai")]
fn with_requested_width(
    provider: OpenAIEmbeddingProvider,
    dimensions: Option<usize>,
) -> OpenAIEmbeddingProvider {
    match dimensions {
        Some(dimensions) => provider.with_dimensions(dimensions),
        None => provider,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Print the best available reply for a failed query and report failure.
fn report_failure(failure: &QueryFailure) -> ExitCode {
    warn!(error = %failure.error, timeout = failure.error.is_timeout(), "query failed");
    println!("{}", failure.fallback_reply());
    ExitCode::FAILURE
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = RagConfig::builder()
        .snapshot_path(&cli.global.snapshot)
        .top_k(cli.global.top_k)
        .response_language(&cli.global.language)
        .build()?;

    let backends = Backends::select(&cli.global)?;
    let retriever = Arc::new(
        Retriever::open(&config, backends.embedder.clone())
            .with_context(|| format!("opening {}", config.snapshot_path.display()))?,
    );

    match cli.command {
        Command::Add { text, meta } => {
            let id = retriever.add_document(&text, into_metadata(meta)).await?;
            println!("added document {id}");
        }
        Command::Seed => {
            let items = SAMPLE_DOCUMENTS.iter().map(|doc| (doc.to_string(), Metadata::new())).collect();
            let ids = retriever.add_documents(items).await?;
            println!("seeded {} documents ({} total)", ids.len(), retriever.len().await);
        }
        Command::Search { query, k } => {
            let hits = retriever.retrieve_scored(&query, k.unwrap_or(config.top_k)).await?;
            if hits.is_empty() {
                println!("no documents");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!("{}. [{:.4}] #{} {}", rank + 1, hit.distance, hit.document.id, hit.document.text);
            }
        }
        Command::Ask { query, show_prompt } => {
            let composer = backends.composer(retriever, config)?;
            match composer.answer_text(&query).await {
                Ok(answer) => {
                    if show_prompt {
                        println!("--- prompt ---\n{}\n--- answer ---", answer.prompt);
                    }
                    println!("{}", answer.response);
                }
                Err(failure) => {
                    if show_prompt {
                        if let Some(prompt) = &failure.prompt {
                            println!("--- prompt ---\n{prompt}\n--- error ---");
                        }
                    }
                    return Ok(report_failure(&failure));
                }
            }
        }
        Command::Image { path, query, no_rag } => {
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let top_k = config.top_k;
            let composer = backends.composer(retriever, config)?;
            match composer.answer_image(ImageInput::sniff(data), &query, !no_rag, top_k).await {
                Ok(answer) => println!("{}", answer.response),
                Err(failure) => return Ok(report_failure(&failure)),
            }
        }
        Command::Clear => {
            retriever.clear().await?;
            println!("cleared {}", config.snapshot_path.display());
        }
        Command::Stats => {
            let stats = serde_json::json!({
                "snapshot": config.snapshot_path,
                "documents": retriever.len().await,
                "dimensions": retriever.dimensions(),
                "generation": retriever.generation().await,
                "embedding_provider": retriever.embedding_provider().name(),
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);
    run(cli).await
}
