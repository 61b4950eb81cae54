//! Signal orchestrator.
//!
//! Runs the capability check once at start, applies the result to the
//! per-medium availability flags, starts the scan loop, and exposes the audio
//! command surface. Scanning and audio share one status record.

mod runner;

pub use runner::SignalOrchestrator;
