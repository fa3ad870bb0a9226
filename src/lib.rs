//! Exercise Forge: quota-driven generation of language-learning exercises
//!
//! Fills a per-category quota of exercises from unreliable LLM oracles (generate, validate,
//! accept, retry), streaming progress to the caller as ordered events, and serves answer
//! checks and session feedback with deterministic local fallbacks.

pub mod cli;
pub mod config;
pub mod error;
pub mod exercise;
pub mod generation;
pub mod logging;
pub mod oracle;
pub mod progress;
pub mod provider;
pub mod review;
pub mod server;
