pub mod account;
pub mod auth;
pub mod config;
pub mod distribution;
pub mod download;
pub mod errors;
pub mod java;
pub mod launch;
pub mod launcher_config;
pub mod messages;
pub mod news;
pub mod presence;
pub mod process;
pub mod progress;
pub mod repair;
pub mod settings;
pub mod status;
pub mod telemetry;
pub mod ui;
