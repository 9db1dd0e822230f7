mod agent;
mod bing;
mod chat;
mod config;
mod pipeline;
mod prompt;
mod query;

pub const USER_AGENT: &str = concat!("sitewise/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::info;

use agent::{AgentDispatcher, SearchTool};
use bing::BingClient;
use chat::ChatClient;
use config::Config;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout; per-request timeouts are tighter.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(
    name = "sitewise",
    version,
    about = "Answer questions from the Leicestershire County Council website"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the site and compose an answer from the results
    Ask {
        /// The question to answer
        question: String,
        /// Number of web results to request
        #[arg(long, default_value_t = pipeline::RESULT_COUNT)]
        count: u8,
    },
    /// Let the model decide per turn whether to search or answer directly
    Agent {
        /// One or more questions, answered in order
        #[arg(required = true)]
        questions: Vec<String>,
        /// Pause between questions to stay under the API rate limit
        #[arg(long, default_value_t = 10)]
        delay_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitewise=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .build()?;
    let search = BingClient::new(http.clone(), &config.bing);
    let chat = ChatClient::new(http, &config.azure)?;

    match cli.command {
        Command::Ask { question, count } => {
            let answer = pipeline::answer(&search, &chat, &question, count).await?;
            println!("{answer}");
        }
        Command::Agent {
            questions,
            delay_secs,
        } => {
            let dispatcher = AgentDispatcher::new(chat, SearchTool::new(search));
            for (i, question) in questions.iter().enumerate() {
                if i > 0 {
                    info!(delay_secs, "pausing between questions");
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                let answer = dispatcher.run_with_fallback(question).await?;
                println!("{answer}");
            }
        }
    }

    Ok(())
}
