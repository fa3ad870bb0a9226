//! Integration tests for exercise-forge

mod config_integration;
mod generation_session;
mod http_api;
mod logging_default;
mod model_providers;

pub use test_utils::{with_env, StubFactory, StubOracle};
