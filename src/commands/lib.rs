//! Slack slash commands for managing AWS infrastructure.
//!
//! - `servers start|stop|status` drives an Auto Scaling group and an
//!   ElastiCache cluster together.
//! - `deploy <stack> <app> [migrate]` resolves OpsWorks names to ids and
//!   triggers a deployment.
//!
//! The receiver Lambda uses [`slack`] and [`router`] to authenticate and
//! route requests; the processor Lambda runs routed invocations through a
//! [`Dispatcher`].

pub mod aws;
pub mod config;
pub mod deploy;
pub mod dispatch;
pub mod error;
pub mod provider;
pub mod router;
pub mod servers;
pub mod slack;
pub mod types;

#[cfg(test)]
mod fakes;

pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use error::{ConfigError, ProviderError};
pub use router::{route, Routed};
pub use types::{DeferredInvocation, Invocation, SlackCommand, SlackResponse};
