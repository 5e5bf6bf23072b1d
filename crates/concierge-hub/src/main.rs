//! Concierge Hub CLI
//!
//! Starts the interaction pipeline with the in-memory gateway adapter. Real
//! deployments replace the adapter with their vendor integrations. Ticket
//! classification runs on the keyword tables by default, or is delegated to
//! an external model endpoint when one is configured.

use concierge_engine::{
    ClassifierEngine, KeywordActorClassifier, KeywordPriorityScorer, KeywordTicketClassifier,
    ModelTicketClassifier, TicketClassifier,
};
use concierge_feedback::FeedbackTracker;
use concierge_gateway::{MemoryGateway, RetryingEgress, TracingAlertSink};
use concierge_hub::{Delivery, HubConfig, HubError, Pipeline};
use concierge_llm::HttpProvider;
use concierge_routing::RoutingManager;
use concierge_store::SqliteStore;
use std::env;
use std::process;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), HubError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut demo = false;
    let mut config = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or_else(|| {
                    HubError::Config("--config requires a file path".to_string())
                })?;
                config = Some(HubConfig::from_file(path)?);
            }
            "--demo" => demo = true,
            "--help" => {
                print_help();
                process::exit(0);
            }
            other => {
                return Err(HubError::Config(format!("Unknown argument: {}", other)));
            }
        }
    }

    let config = config.unwrap_or_else(|| {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: concierge-hub --config <path-to-config.toml> [--demo]");
        eprintln!();
        HubConfig::default_test_config()
    });

    match config.model_endpoint.clone() {
        Some(endpoint) => {
            let provider = HttpProvider::new(endpoint, config.model_name.clone())
                .map_err(|e| HubError::Config(e.to_string()))?;
            serve(config, ModelTicketClassifier::new(provider), demo).await
        }
        None => serve(config, KeywordTicketClassifier, demo).await,
    }
}

/// Build the pipeline around the chosen ticket strategy and run it
async fn serve<T>(config: HubConfig, ticket: T, demo: bool) -> Result<(), HubError>
where
    T: TicketClassifier + Send + Sync + 'static,
{
    let store = SqliteStore::new(&config.database_path)
        .map_err(|e| HubError::Store(e.to_string()))?;
    let engine = ClassifierEngine::new(
        KeywordActorClassifier,
        ticket,
        KeywordPriorityScorer,
        config.engine.clone(),
    );
    let router = RoutingManager::new(config.routing.clone())
        .map_err(|e| HubError::Config(e.to_string()))?;
    let egress = RetryingEgress::new(MemoryGateway::new(), TracingAlertSink)
        .with_max_attempts(config.egress_max_attempts)
        .with_base_delay(Duration::from_millis(config.egress_base_delay_ms));
    let feedback = FeedbackTracker::new(config.feedback.clone());

    let pipeline = Pipeline::new(store, engine, router, egress, feedback);

    let (tx, rx) = mpsc::channel::<Delivery>(64);

    if demo {
        for delivery in demo_deliveries() {
            tx.send(delivery)
                .await
                .map_err(|e| HubError::Config(format!("Demo send failed: {}", e)))?;
        }
        drop(tx);
        pipeline.drain(rx).await?;
        println!("{}", pipeline.feedback().summary());
        return Ok(());
    }

    pipeline.run(rx).await
}

/// Sample deliveries exercising the main pipeline paths
fn demo_deliveries() -> Vec<Delivery> {
    let received_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    vec![
        Delivery {
            channel: "email".to_string(),
            payload: "Please refund my last charge, I was double charged this month.".to_string(),
            received_at,
            actor_hint: None,
            dedup_key: "demo-email-1".to_string(),
        },
        Delivery {
            channel: "call".to_string(),
            payload: "Agent: Hello.\nCaller: This is not a sales call, act now for a limited time offer on seo services."
                .to_string(),
            received_at,
            actor_hint: None,
            dedup_key: "demo-call-1".to_string(),
        },
        Delivery {
            channel: "ticket".to_string(),
            payload: "Franchise royalty question\nQuestion about the royalty change for my location."
                .to_string(),
            received_at,
            actor_hint: None,
            dedup_key: "demo-ticket-1".to_string(),
        },
    ]
}

fn print_help() {
    println!("Concierge Hub - Interaction Classification and Routing");
    println!();
    println!("USAGE:");
    println!("    concierge-hub --config <path-to-config.toml> [--demo]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --demo             Process sample deliveries and exit");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - database_path: SQLite path (':memory:' for ephemeral runs)");
    println!("    - model_endpoint: optional external classification model URL");
    println!("    - [engine]: model_version, epsilon, strategy_timeout_secs");
    println!("    - [routing]: thresholds, review_queue, destinations, rules");
    println!("    - [feedback]: window_size");
    println!();
}
