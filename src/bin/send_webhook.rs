//! Send a signed demo event to a running hookguard instance.
//!
//! Usage:
//!   send-webhook
//!   send-webhook --repeat 3
//!   send-webhook --url http://localhost:9000/webhooks/provider

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use hookguard::utils::get_env_with_prefix;
use hookguard::webhooks::verification::unix_now;
use hookguard::{DEFAULT_SIGNATURE_HEADER, sign_payload};
use serde_json::json;
use std::process::ExitCode;
use uuid::Uuid;

const DEFAULT_URL: &str = "http://127.0.0.1:8000/webhooks/provider";

#[derive(Parser, Debug)]
#[command(name = "send-webhook")]
#[command(about = "Send signed webhook events to a hookguard server", long_about = None)]
struct Cli {
    /// Webhook endpoint URL
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Number of times to send the same event (exercises idempotency)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,

    /// Header carrying the signature
    #[arg(long, default_value = DEFAULT_SIGNATURE_HEADER)]
    header: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET").filter(|s| !s.is_empty()) else {
        print_error("Environment variable WEBHOOK_SECRET is missing.");
        print_info("Set it in your shell or .env file before running this command.");
        print_info("Example: export WEBHOOK_SECRET=whsec_...");
        return Ok(ExitCode::FAILURE);
    };

    // One payload and one signature for every attempt, so repeats are true replays
    let event_id = format!("evt_{}", Uuid::new_v4());
    let payload = serde_json::to_vec(&json!({
        "id": event_id,
        "type": "payment_intent.succeeded",
        "created": unix_now(),
        "data": {
            "amount": 2000,
            "currency": "usd"
        }
    }))?;
    print_info(&format!(
        "Generated event {} (reused for all {} attempts)",
        event_id.bold(),
        cli.repeat
    ));

    let signature = sign_payload(&payload, &secret, unix_now());
    print_info(&format!("{}: {}", cli.header, signature));

    let client = reqwest::Client::new();
    print_info(&format!("Sending POST to {} (repeat: {})", cli.url, cli.repeat));

    let mut first_accepted = false;
    for attempt in 1..=cli.repeat {
        let response = client
            .post(&cli.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(cli.header.as_str(), signature.as_str())
            .body(payload.clone())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                print_error(&format!("Could not connect to {}. Is the server running?", cli.url));
                print_info("Start it with: cargo run --bin hookguard");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        println!(
            "{} {}/{} -> status {}, body {}",
            "attempt".cyan(),
            attempt,
            cli.repeat,
            status.as_u16(),
            body
        );

        if attempt == 1 {
            first_accepted = status == reqwest::StatusCode::OK;
        }
    }

    if first_accepted {
        print_success("First webhook accepted.");
        Ok(ExitCode::SUCCESS)
    } else {
        print_error("First webhook rejected.");
        Ok(ExitCode::FAILURE)
    }
}

fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

fn print_info(message: &str) {
    println!("{} {}", "→".blue(), message);
}

fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}
