//! Cluster-side consumers of the extension core.
//!
//! This crate illustrates how the framework's pluggable behaviors sit on
//! top of [`ferrox_core`]: the [`LoadBalance`] contract is resolved per
//! call through its adaptive dispatcher, and the [`RouterChain`] assembles
//! its pipeline from activated [`Router`] extensions.

pub mod error;
pub mod invoker;
pub mod loadbalance;
pub mod router;

pub use error::{ClusterError, Result};
pub use invoker::{Invoker, StaticInvoker};
pub use loadbalance::{register_load_balance, LoadBalance, LOAD_BALANCE_KEY};
pub use router::{register_routers, Router, RouterChain};
