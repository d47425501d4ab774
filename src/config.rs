//! Application configuration for the demo binaries.
//!
//! The bus itself takes its two capacities as constructor arguments and
//! owns no configuration surface of its own (see [`crate::bus::EventBus::new`]);
//! this module exists for the ambient concerns around it — logging setup and
//! demo-binary capacity overrides.

/// Configuration for a demo binary built on top of [`crate::bus::EventBus`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_dir: String,
    pub log_file: String,
    /// One of "hourly", "daily", "never".
    pub rotation: String,
    pub log_level: String,
    pub use_json: bool,
    pub enable_tracing: bool,
    pub ingress_cap: usize,
    pub per_sub_cap: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_file: "md-bus.log".to_string(),
            rotation: "never".to_string(),
            log_level: "info".to_string(),
            use_json: false,
            enable_tracing: true,
            ingress_cap: 65536,
            per_sub_cap: 65536,
        }
    }
}
