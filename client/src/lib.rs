pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod logging;
pub mod render;
pub mod transport;
pub mod tui;
pub mod ui;

pub use client::ChatConnectionClient;
pub use error::{ChatError, Result};
