//! Veritus Discovery - Entry Point
//!
//! Serves the HTTP API, or runs a single topic search in the terminal.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use veritus_discovery::{
    Caller, Config, JobCoordinator, PollEvent, VeritusClient, server,
};

#[derive(Parser, Debug)]
#[command(name = "veritus-discovery")]
#[command(about = "Research paper discovery over the Veritus search API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// HTTP server port
        #[arg(long, default_value = "3000", env = "PORT")]
        port: u16,
    },
    /// Search a topic and wait for the results
    Search {
        /// Research topic, e.g. "graph neural networks"
        topic: String,
    },
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { port } => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), port, "Starting Veritus discovery server");
            server::serve(config, port).await?;
        }
        Command::Search { topic } => search(config, &topic).await?,
    }

    Ok(())
}

async fn search(config: Config, topic: &str) -> anyhow::Result<()> {
    let client = VeritusClient::new(&config)?;
    let coordinator = JobCoordinator::new(Arc::new(client), config.poll_policy.clone());

    let handle = coordinator.submit(&Caller::User("cli".to_string()), topic).await?;
    println!("Submitted job {}", handle.job_id());

    let mut session = coordinator.poll(handle);
    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancelling search");
            cancel.cancel();
        }
    });

    while let Some(event) = session.next().await {
        match event {
            PollEvent::Pending { status, attempt, next_poll_in } => {
                println!(
                    "[{attempt}] {} - checking again in {:.1}s",
                    status.as_str(),
                    next_poll_in.as_secs_f64()
                );
            }
            PollEvent::Succeeded(papers) => {
                println!("Found {} papers:", papers.len());
                for paper in &papers {
                    let year = paper.year.map(|y| format!(" ({y})")).unwrap_or_default();
                    println!("  - {}{year} [{} citations]", paper.title, paper.citations());
                }
            }
            PollEvent::Failed(failure) => anyhow::bail!("{failure}"),
        }
    }

    Ok(())
}
