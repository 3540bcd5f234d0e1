//! CLI domain: parse, route, help, output, and presentation only.
//! No readiness orchestration; the route table dispatches to the registry and doctor.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_ensure_summary, format_list_json, format_list_text};
pub use route::{CommandReport, RunContext};
