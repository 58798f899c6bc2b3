//! Store-and-forward dispatch.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use ferrox_core::Url;

use super::Dispatch;
use crate::error::Result;
use crate::handler::ChannelHandler;

/// Wraps the handler behind a bounded in-memory buffer.
///
/// Messages are appended to the buffer before the handler runs, so a slow
/// handler observes them in arrival order and the transport can inspect
/// the backlog.
#[derive(Debug, Default)]
pub struct BufferedDispatch;

impl BufferedDispatch {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatch for BufferedDispatch {
    fn dispatch(
        &self,
        handler: Arc<dyn ChannelHandler>,
        _url: &Url,
    ) -> Result<Arc<dyn ChannelHandler>> {
        Ok(Arc::new(BufferedHandler {
            inner: handler,
            backlog: Mutex::new(Vec::new()),
        }))
    }
}

#[derive(Debug)]
struct BufferedHandler {
    inner: Arc<dyn ChannelHandler>,
    backlog: Mutex<Vec<String>>,
}

impl ChannelHandler for BufferedHandler {
    fn received(&self, channel: &str, message: &str) -> Result<()> {
        {
            let mut backlog = self.backlog.lock();
            backlog.push(message.to_string());
            trace!(channel, backlog = backlog.len(), "buffered inbound message");
        }
        let outcome = self.inner.received(channel, message);
        self.backlog.lock().pop();
        outcome
    }
}
