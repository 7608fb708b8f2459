mod config;
mod ingest;
mod stats;

pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use stats::StatsArgs;

pub use config::handle_config;
pub use ingest::handle_ingest;
pub use stats::handle_stats;
