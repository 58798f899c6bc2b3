//! Remoting-side consumers of the extension core.
//!
//! The transport hands every inbound event to a [`ChannelHandler`]. How
//! that handler runs (inline on the I/O thread, buffered, on a pool) is a
//! pluggable behavior: the [`Dispatch`] contract is resolved adaptively
//! from the url wrapped around the server, with no per-call context.

pub mod dispatch;
pub mod error;
pub mod handler;

pub use dispatch::{register_dispatch, wrap, Dispatch, DISPATCHER_KEY};
pub use error::{RemotingError, Result};
pub use handler::ChannelHandler;
