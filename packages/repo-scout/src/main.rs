//! Repo Scout CLI
//!
//! Finds notable repositories for a topic with an agent loop, stores them in
//! SQLite and prints the ranked table.
//!
//! # Usage
//!
//! ```bash
//! repo-scout find --topic "Vector Databases"
//! repo-scout find --custom-prompt "Find Rust web frameworks with WebSocket support"
//! repo-scout find --display-only
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use repo_scout::{
    render_records, Actions, Config, Credentials, HttpFetch, OpenAIEngine, Orchestrator,
    RecordStore, Scout, ScoutError, SqliteStore, TavilySearch, Task,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "repo-scout")]
#[command(about = "An agent that finds top GitHub repositories for a given technology")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find and analyze the top 5 repositories for a topic, then show the database
    Find(FindArgs),
}

#[derive(Args)]
struct FindArgs {
    /// The technology topic to search for
    #[arg(long, default_value = "Machine Learning")]
    topic: String,

    /// A specific instruction to guide the agent's search, used instead of the topic wording
    #[arg(long)]
    custom_prompt: Option<String>,

    /// Only display repositories already in the database
    #[arg(long)]
    display_only: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,repo_scout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Find(args) => find(args).await,
    }
}

async fn find(args: FindArgs) -> Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;

    // Credentials are checked before any database or network work
    let credentials = if args.display_only {
        None
    } else {
        Some(Credentials::from_env().context("Missing credentials")?)
    };

    let store = SqliteStore::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    let Some(credentials) = credentials else {
        display(&store).await?;
        store.close().await;
        return Ok(ExitCode::SUCCESS);
    };

    println!(
        "{}",
        format!("Running GitHub Scout Agent for topic: {}...", args.topic)
            .green()
            .bold()
    );

    let task = match args.custom_prompt {
        Some(prompt) => {
            println!("{} {}", "Using custom prompt:".yellow(), prompt);
            Task::custom(prompt)
        }
        None => Task::from_topic(&args.topic),
    };

    let search = TavilySearch::new(credentials.tavily_api_key.clone())
        .context("Failed to build search client")?;
    let fetch = HttpFetch::new().context("Failed to build HTTP client")?;
    let engine = OpenAIEngine::from_config(&config, &credentials)
        .context("Failed to build OpenAI client")?;
    let orchestrator = Orchestrator::new(engine, Actions::new(search, fetch))
        .with_max_iterations(config.max_iterations);
    let scout = Scout::new(orchestrator, store);

    match scout.discover(&task).await {
        Ok(report) => {
            println!();
            println!(
                "{}",
                "Agent finished. Repositories saved to database.".green().bold()
            );
            println!("  {}", report);
        }
        Err(ScoutError::Extraction(failure)) => {
            eprintln!();
            eprintln!(
                "{}",
                format!("Error parsing or saving response: {}", failure)
                    .red()
                    .bold()
            );
            eprintln!("Raw response from agent:");
            eprintln!("{}", failure.payload());
            scout.store().close().await;
            return Ok(ExitCode::FAILURE);
        }
        Err(ScoutError::LoopExhausted {
            iterations,
            transcript,
        }) => {
            eprintln!();
            eprintln!(
                "{}",
                format!(
                    "Agent stopped after {} iterations without a final answer.",
                    iterations
                )
                .red()
                .bold()
            );
            eprintln!("Actions taken:");
            for (i, invocation) in transcript.iter().enumerate() {
                eprintln!("  {}. {}({})", i + 1, invocation.action, invocation.argument);
            }
            scout.store().close().await;
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("Discovery run failed"),
    }

    display(scout.store()).await?;
    scout.store().close().await;
    Ok(ExitCode::SUCCESS)
}

async fn display(store: &impl RecordStore) -> Result<()> {
    println!();
    println!(
        "{}",
        "Displaying repositories from database...".blue().bold()
    );

    let records = store
        .read_all()
        .await
        .context("Failed to read repositories")?;
    print!("{}", render_records(&records));
    Ok(())
}
