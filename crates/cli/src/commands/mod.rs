//! CLI commands

mod apps;
mod metrics;

pub use apps::apps;
pub use metrics::{namespaces, pods, summary};
