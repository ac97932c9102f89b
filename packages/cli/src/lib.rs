// ABOUTME: Library side of the robodesk binary
// ABOUTME: Configuration, service wiring and the HTTP server entry point

pub mod config;
pub mod server;
pub mod services;

pub use config::{Config, ConfigError};
pub use server::{build_app, run_server};

#[cfg(test)]
mod tests;
