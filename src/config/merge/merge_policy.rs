//! Merge rules: scalar defaults seeded below every other source.

use crate::config::{DEFAULT_BIND, DEFAULT_FAULT_INJECTION_TOPIC, DEFAULT_MODEL};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
/// List-valued settings (the category table) fall back to serde defaults instead, so a
/// file that declares its own table replaces the default one whole.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.bind", DEFAULT_BIND)?
        .set_default("provider.provider_type", "openai")?
        .set_default("provider.model", DEFAULT_MODEL)?
        .set_default("oracle.fault_injection_topic", DEFAULT_FAULT_INJECTION_TOPIC)?
        .set_default("generation.max_attempts", 5)
}
