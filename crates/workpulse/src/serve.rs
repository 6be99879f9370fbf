// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `workpulse serve` and `workpulse run-once`.
//!
//! Both commands build the same object graph: the SQLite store, one adapter
//! and formatter per configured platform, the Anthropic report generator and
//! the fan-out job. `serve` adds the cron trigger and the webhook gateway.

use std::sync::Arc;

use tracing::{error, info, warn};
use workpulse_anthropic::AnthropicReportGenerator;
use workpulse_commands::CommandService;
use workpulse_config::WorkpulseConfig;
use workpulse_core::{PlatformRegistry, WorkpulseError};
use workpulse_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use workpulse_resilience::OutboundGuard;
use workpulse_scheduler::{FanOutJob, Scheduler};
use workpulse_slack::{SlackAdapter, SlackFormatter};
use workpulse_storage::SqliteStore;
use workpulse_telegram::{TelegramAdapter, TelegramFormatter};

use crate::{prometheus, shutdown};

/// Long-lived services shared by the gateway and the scheduler.
struct Services {
    store: Arc<SqliteStore>,
    registry: Arc<PlatformRegistry>,
    commands: Arc<CommandService>,
    job: Arc<FanOutJob>,
}

impl Services {
    async fn build(config: &WorkpulseConfig) -> Result<Self, WorkpulseError> {
        let store = Arc::new(SqliteStore::open(&config.storage).await?);
        info!(path = %config.storage.database_path, "record store opened");

        let registry = Arc::new(build_registry(config)?);
        if registry.is_empty() {
            warn!("no messaging platform configured, webhooks will return 404");
        }

        let generator = Arc::new(AnthropicReportGenerator::new(&config.anthropic)?);
        let commands = Arc::new(CommandService::new(store.clone()));
        let job = Arc::new(FanOutJob::new(
            store.clone(),
            registry.clone(),
            generator,
            &config.schedule,
        ));

        Ok(Self {
            store,
            registry,
            commands,
            job,
        })
    }

    /// Drop every other holder of the store, then checkpoint and close it.
    async fn close(self) -> Result<(), WorkpulseError> {
        let Self {
            store,
            registry,
            commands,
            job,
        } = self;
        drop((registry, commands, job));
        match Arc::try_unwrap(store) {
            Ok(store) => store.close().await,
            Err(_) => {
                warn!("record store still referenced at shutdown, skipping checkpoint");
                Ok(())
            }
        }
    }
}

/// One adapter and formatter per platform that has a bot token.
fn build_registry(config: &WorkpulseConfig) -> Result<PlatformRegistry, WorkpulseError> {
    let guard = Arc::new(OutboundGuard::from_config(&config.rate_limit));
    let mut registry = PlatformRegistry::new();

    if config.slack.is_enabled() {
        let adapter = SlackAdapter::new(&config.slack, guard.clone())?;
        registry.register(Arc::new(adapter), Arc::new(SlackFormatter));
        info!("slack adapter registered");
    }

    if config.telegram.is_enabled() {
        let adapter = TelegramAdapter::new(&config.telegram, config.app.mode, guard)?;
        registry.register(Arc::new(adapter), Arc::new(TelegramFormatter::new()));
        info!(mode = %config.app.mode, "telegram adapter registered");
    }

    Ok(registry)
}

/// Runs `workpulse serve` until SIGINT or SIGTERM.
pub async fn run_serve(config: WorkpulseConfig) -> Result<(), WorkpulseError> {
    init_tracing(&config.app.log_level);
    info!(name = %config.app.name, mode = %config.app.mode, "starting workpulse");

    let metrics_handle = prometheus::install_recorder()?;
    let services = Services::build(&config).await?;
    let cancel = shutdown::install_signal_handler();

    let scheduler_task = if config.schedule.enabled {
        let scheduler = Arc::new(Scheduler::new(services.job.clone(), &config.schedule)?);
        Some(tokio::spawn(scheduler.run(cancel.clone())))
    } else {
        info!("schedule.enabled = false, fan-out only runs via `workpulse run-once`");
        None
    };

    let state = GatewayState {
        registry: services.registry.clone(),
        commands: services.commands.clone(),
        health: HealthState::new().with_metrics(prometheus::render_fn(metrics_handle)),
    };
    let server = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let served = start_server(&server, state, cancel.clone()).await;

    // A gateway that exits on its own (bind failure) takes the scheduler down with it.
    cancel.cancel();
    if let Some(task) = scheduler_task
        && let Err(e) = task.await
    {
        error!(error = %e, "scheduler task terminated abnormally");
    }

    services.close().await?;
    info!("workpulse stopped");
    served
}

/// Runs `workpulse run-once`: a single fan-out pass, summary printed as JSON.
pub async fn run_once(config: WorkpulseConfig) -> Result<(), WorkpulseError> {
    init_tracing(&config.app.log_level);

    let services = Services::build(&config).await?;
    let outcome = services.job.run().await;
    services.close().await?;

    let summary = outcome?;
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| WorkpulseError::Internal(format!("failed to encode run summary: {e}")))?;
    println!("{json}");
    Ok(())
}

/// `RUST_LOG` wins; otherwise `workpulse*` crates log at `log_level`, everything else at warn.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("workpulse={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
