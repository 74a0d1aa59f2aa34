// ============================================================================
// tripweaver — CLI front end for the hybrid travel assistant
// ============================================================================
// Usage:
//   tripweaver chat                Interactive session (type 'exit' to quit)
//   tripweaver ask "<question>"    One-shot question, prints the answer
//   tripweaver health              Check that the vector index is reachable
// ============================================================================

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tripweaver_core::clients::{Neo4jHttpGraph, OpenAiClient, QdrantIndex, UpstashRedisCache};
use tripweaver_core::config::VECTOR_DIM;
use tripweaver_core::{ChatPipeline, Config, ConversationTurn, PipelineSettings};

/// Hybrid travel assistant: vector search + knowledge graph + chat
#[derive(Parser)]
#[command(name = "tripweaver", version, about = "Hybrid RAG travel assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session with conversation memory
    Chat,

    /// Ask a single question and exit
    Ask {
        /// The travel question to answer
        query: String,
    },

    /// Check connectivity to the vector index
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat => {
            let pipeline = build_pipeline().await?;
            run_chat_loop(&pipeline).await
        }
        Commands::Ask { query } => {
            let pipeline = build_pipeline().await?;
            match pipeline.answer(&query, None, Vec::new()).await {
                Ok(outcome) => {
                    println!("{}", outcome.answer);
                    Ok(())
                }
                Err(e) => {
                    error!("Pipeline failed: {e}");
                    println!("Sorry, an error occurred. Please try again.");
                    Ok(())
                }
            }
        }
        Commands::Health => {
            let config = Config::from_env().context("configuration")?;
            let index =
                QdrantIndex::new(&config.qdrant_url, &config.qdrant_collection, VECTOR_DIM)
                    .await
                    .context("connecting to the vector index")?;
            if index.health_check().await? {
                println!("Vector index is healthy.");
            } else {
                println!("Vector index is unreachable.");
            }
            Ok(())
        }
    }
}

/// Build the pipeline from environment configuration.
/// Clients are created once here and shared for the process lifetime.
async fn build_pipeline() -> Result<ChatPipeline> {
    let config = Config::from_env().context("configuration")?;

    info!("Initializing clients...");
    let openai = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    ));
    let index = Arc::new(
        QdrantIndex::new(&config.qdrant_url, &config.qdrant_collection, VECTOR_DIM)
            .await
            .context("connecting to the vector index")?,
    );
    let graph = Arc::new(Neo4jHttpGraph::new(
        &config.neo4j_http_url,
        &config.neo4j_database,
        config.neo4j_username.clone(),
        config.neo4j_password.clone(),
    ));
    let cache = Arc::new(UpstashRedisCache::new(
        &config.upstash_redis_url,
        config.upstash_redis_token.clone(),
    ));
    info!("Clients initialized successfully.");

    Ok(ChatPipeline::new(
        openai.clone(),
        openai,
        index,
        graph,
        cache,
        PipelineSettings::default(),
    ))
}

/// Interactive loop; history lives for the session and is windowed by the core
async fn run_chat_loop(pipeline: &ChatPipeline) -> Result<()> {
    println!("Hybrid travel assistant is ready. Type 'exit' to quit.");

    let stdin = std::io::stdin();
    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut conversation_id: Option<String> = None;

    loop {
        print!("\nEnter your travel question: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() || query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        match pipeline
            .answer(query, conversation_id.clone(), history.clone())
            .await
        {
            Ok(outcome) => {
                println!("\n=== Assistant Answer ===\n");
                println!("{}", outcome.answer);
                println!("\n========================");
                history = outcome.updated_history;
                conversation_id = Some(outcome.conversation_id);
            }
            Err(e) => {
                error!("An error occurred during the RAG pipeline: {e}");
                println!("Sorry, an error occurred. Please try again.");
            }
        }
    }

    info!("Exiting gracefully.");
    Ok(())
}
