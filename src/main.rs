use hookguard::{App, ConfigBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be populated
    dotenvy::dotenv().ok();

    let config = ConfigBuilder::new().from_env().build()?;
    hookguard::init_tracing_with_config(&config);

    tracing::info!(
        database = %config.database.path,
        tolerance_seconds = config.webhook.tolerance_seconds,
        signature_header = %config.webhook.signature_header,
        "Starting hookguard"
    );

    let app = App::from_config(config).await?;
    app.serve().await?;

    Ok(())
}
