//! The inbound event handler seen by the transport.

use crate::error::Result;

/// Handles events arriving on one channel.
pub trait ChannelHandler: std::fmt::Debug + Send + Sync {
    /// A message arrived on `channel`.
    fn received(&self, channel: &str, message: &str) -> Result<()>;
}
