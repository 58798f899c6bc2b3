//! Inline dispatch.

use std::sync::Arc;

use ferrox_core::Url;

use super::Dispatch;
use crate::error::Result;
use crate::handler::ChannelHandler;

/// Runs the handler inline on the receiving thread.
#[derive(Debug, Default)]
pub struct DirectDispatch;

impl DirectDispatch {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatch for DirectDispatch {
    fn dispatch(
        &self,
        handler: Arc<dyn ChannelHandler>,
        _url: &Url,
    ) -> Result<Arc<dyn ChannelHandler>> {
        // Nothing to add: the handler itself runs on the receiving thread.
        Ok(handler)
    }
}
