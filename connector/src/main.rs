use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};

use api_client::{create_api, Initializer};
use cp_connector::config::split_subjects;
use cp_connector::logging::init_logging;
use cp_connector::{ControlPlane, EnvConfig, EventHandler, HandlerError, StaticSubscriptionSource};
use event_source::{CancellationToken, ControlPlaneEvent, EventSender, EventSource};
use nats_connector::{NatsConnector, DEFAULT_NATS_URL};

/// Upper bound on waiting for the unsubscribe after Ctrl-C.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Control-plane connector
///
/// Subscribes an integration to control-plane events over NATS and logs
/// every event it receives.
#[derive(Parser, Debug)]
#[command(name = "cp-connector")]
#[command(version)]
pub struct Args {
    /// Integration name, also used as the NATS queue group
    #[arg(short, long, env = "CP_INTEGRATION_NAME")]
    pub name: String,

    /// Comma separated subjects to subscribe to
    #[arg(short, long, env = "CP_SUBJECTS", default_value = "")]
    pub subjects: String,

    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = DEFAULT_NATS_URL)]
    pub nats_url: String,

    /// Public control-plane API endpoint; leave empty inside the cluster
    #[arg(long, env = "CP_API_ENDPOINT", default_value = "")]
    pub api_endpoint: String,

    /// Token for the public API
    #[arg(long, env = "CP_API_TOKEN", default_value = "", hide_env_values = true)]
    pub api_token: String,

    /// Log mode (silent, development, json, debug)
    #[arg(long, env = "CP_LOG_MODE", default_value = "development")]
    pub log_mode: String,

    /// NATS connect timeout in seconds
    #[arg(long, env = "CP_CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout: u64,

    /// Capacity of the event update channel
    #[arg(long, env = "CP_EVENT_BUFFER_SIZE", default_value = "100")]
    pub event_buffer_size: usize,
}

impl TryFrom<Args> for EnvConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let mut config = EnvConfig {
            api_endpoint: args.api_endpoint,
            api_token: args.api_token,
            nats_url: args.nats_url,
            integration_name: args.name,
            subjects: split_subjects(&args.subjects),
            log_mode: args.log_mode.parse().context("Invalid --log-mode")?,
            connect_timeout: Duration::from_secs(args.connect_timeout),
            ..EnvConfig::default()
        };
        config.event_source.update_buffer_size = args.event_buffer_size;

        config.validate()?;
        Ok(config)
    }
}

/// Logs every event it receives.
struct LogEventHandler;

#[async_trait]
impl EventHandler for LogEventHandler {
    async fn on_event(
        &self,
        event: ControlPlaneEvent,
        _sender: EventSender,
    ) -> std::result::Result<(), HandlerError> {
        info!(
            id = event.id.as_deref().unwrap_or_default(),
            event_type = event.event_type().unwrap_or_default(),
            context = event.context.as_deref().unwrap_or_default(),
            "Received event"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EnvConfig::try_from(Args::parse())?;
    init_logging(config.log_mode)?;

    let api = create_api(None, &config.endpoint(), &Initializer::default())
        .context("Could not create control-plane API client")?;
    info!(internal = api.is_internal(), "Control-plane API selected");

    let connector = NatsConnector::connect(config.nats())
        .await
        .context("Could not connect to NATS")?;
    let source = EventSource::new(Arc::new(connector));

    let control_plane = ControlPlane::new(
        source.clone(),
        Arc::new(StaticSubscriptionSource::new(config.subjects.clone())),
        Arc::new(LogEventHandler),
    )
    .with_config(config.event_source.clone());

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C, shutting down"),
        }
        shutdown.cancel();
    });

    control_plane.run(cancel, config.registration()).await?;

    if tokio::time::timeout(TEARDOWN_TIMEOUT, source.stopped()).await.is_err() {
        warn!(timeout = ?TEARDOWN_TIMEOUT, "Unsubscribe did not finish, disconnecting anyway");
    }

    source.stop().await.context("Could not disconnect from NATS")?;
    info!("Connector stopped");

    Ok(())
}
