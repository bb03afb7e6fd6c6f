use crate::{server, RelayConfig};
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use tracing::{error, info};

/// CLI entry point for the outing-relay server
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = command().get_matches();
    let config = apply_overrides(RelayConfig::from_env()?, &matches)?;

    info!(
        "Relaying to {} with model {} (timeout {}s)",
        config.base_url,
        config.model,
        config.timeout.as_secs()
    );

    if let Err(e) = server::serve(config).await {
        error!("Server stopped: {}", e);
        return Err(e.into());
    }

    Ok(())
}

fn command() -> Command {
    Command::new("outing-relay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Relay outing-planning requests to a chat-completion API and normalize the replies")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Interface to bind (or set HOST env var)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on (or set PORT env var)"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Completion model (or set OPENAI_MODEL env var)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Completion API base URL (or set OPENAI_BASE_URL env var)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Completion call timeout in seconds (or set OPENAI_TIMEOUT_SECS env var)"),
        )
}

/// Command-line values win over the environment.
fn apply_overrides(
    mut config: RelayConfig,
    matches: &ArgMatches,
) -> Result<RelayConfig, Box<dyn std::error::Error>> {
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config.port = port.parse()?;
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.model = model.clone();
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.base_url = base_url.clone();
    }
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        config.timeout = Duration::from_secs(timeout.parse()?);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_values() {
        let matches = command()
            .try_get_matches_from(["outing-relay", "--port", "8080", "-m", "gpt-4o-mini", "-t", "10"])
            .unwrap();

        let config = apply_overrides(RelayConfig::default(), &matches).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        let matches = command()
            .try_get_matches_from(["outing-relay", "--port", "http"])
            .unwrap();

        assert!(apply_overrides(RelayConfig::default(), &matches).is_err());
    }
}
