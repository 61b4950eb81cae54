pub mod api;
pub mod ingest;
pub mod metrics;
pub mod state;
