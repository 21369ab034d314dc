//! Outbound side effects of the monitoring pipeline.
//!
//! Insights become chat notifications through a [`NotificationChannel`],
//! infrastructure alerts become drone missions through
//! [`drone::HttpDroneDispatcher`], and every cycle ends with a heartbeat
//! posted by a [`heartbeat::HeartbeatSink`]. [`manager::ActionDispatcher`]
//! ties the three together.

pub mod channels;
pub mod drone;
pub mod error;
pub mod heartbeat;
pub mod manager;
pub mod utils;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use error::Result;

/// A chat transport that delivers a pre-formatted text message.
///
/// Implementations make a single attempt; failures are returned to the
/// caller, which logs them.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Delivers `text` through this channel.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx answer.
    async fn send(&self, text: &str) -> Result<()>;

    /// Returns the channel type name (e.g., `"webhook"`).
    fn channel_name(&self) -> &str;
}
