pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod scheduler;

pub use cli::{Cli, Command};
pub use config::Config;
pub use scheduler::Scheduler;
