//! CLI domain: parse and route only.
//! No domain orchestration; the route table dispatches to the generation core and server.

mod parse;
mod route;

pub use parse::{Cli, Commands, ConfigCommands};
pub use route::{RunContext, EXIT_FAILURE};
