pub mod audio;
pub mod capabilities;
pub mod config;
pub mod identify;
pub mod metrics;
pub mod node;
pub mod orchestrator;
pub mod process;
pub mod scanner;
pub mod testing;

pub use audio::{
    AudioBackend, AudioController, AudioError, AudioRequest, AudioSessionState, DemodMode, Gain,
    ProcessAudioBackend, TuneRequest,
};
pub use capabilities::{CapabilityProber, CapabilityReport, MediumAvailability, ToolStatus};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, IngestConfig,
    SanitizedConfig,
};
pub use identify::{identify_frequency, lookup_oui, FrequencyId};
pub use node::{NodeIdentity, NodeStore};
pub use orchestrator::SignalOrchestrator;
pub use process::{CommandRunner, ProcessError, SystemRunner};
pub use scanner::{
    DiscoveredSignal, Discovery, DiscoveryCallback, GpsFix, Medium, ScanCoordinator, ScanError,
    ScannerStatus,
};
