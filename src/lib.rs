//! Configuration manager for claude-code-router.
//!
//! ```text
//! command surface → ConfigStore mutation → ConfigStore::save → RouterProcess::restart
//! ```
//!
//! [`config::ConfigStore`] owns the router's `config.json`;
//! [`models::ModelFetcher`] lists a provider's models and
//! [`restart::RouterProcess`] restarts the router.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod restart;
