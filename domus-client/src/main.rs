//! Domus command-line entry point.

use domus_client::cli::parse_args;
use domus_client::config::ClientConfig;
use domus_client::error::ClientError;
use domus_client::session::Session;
use domus_client::telemetry::init_tracing;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ClientConfig::load_from_args(args.clone())?;
    init_tracing(&config.logging)?;
    let command = parse_args(args)?;

    let mut session = Session::new(config)?;
    if command.selections.is_empty() {
        if let Err(err) = session.restore().await {
            warn!(error = %err, "could not restore previous session");
        }
    } else {
        for (level, id) in &command.selections {
            session.select(*level, Some(*id)).await?;
        }
    }

    let data = session.list(command.kind, &command.filter).await?;
    println!("{}", serde_json::to_string_pretty(&data)?);

    if let Err(err) = session.persist() {
        warn!(error = %err, "could not persist session");
    }
    Ok(())
}
