use anyhow::Result;
use sage_agent::config::AgentConfig;
use sage_agent::driver::{run_once, ERROR_BACKOFF};
use sage_agent::pipeline::Pipeline;
use sage_agent::state::AppState;
use sage_notify::utils::redact_url;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sage=info".parse()?))
        .init();

    let config_path = std::env::args().nth(1);
    let config = AgentConfig::from_sources(config_path.as_deref())?;

    tracing::info!(
        control_api = %config.control_api,
        prometheus = %config.prometheus_url,
        drone_bridge = %config.drone_bridge_url,
        wallet_api = %config.o2_wallet_api,
        slack = %redact_url(&config.slack_webhook_url),
        o2_monitoring = config.o2.enabled,
        interval_secs = config.interval_secs,
        "sage-agent starting"
    );

    let state = AppState::new(&config);
    let server_state = state.clone();
    let http_port = config.http_port;
    tokio::spawn(async move {
        if let Err(e) = sage_agent::api::serve(server_state, http_port).await {
            tracing::error!(error = %e, "Health endpoint stopped");
        }
    });

    let mut pipeline = Pipeline::from_config(&config);
    let mut tick = interval(Duration::from_secs(config.interval_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                cycle += 1;
                tracing::debug!(cycle, "Cycle starting");
                match run_once(&mut pipeline, &state).await {
                    Ok(report) => tracing::info!(
                        cycle,
                        insights = report.insights.len(),
                        coherence = report.coherence,
                        "Cycle complete"
                    ),
                    Err(e) => {
                        tracing::error!(cycle, error = %e, "Cycle failed");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
