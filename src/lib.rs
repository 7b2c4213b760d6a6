//! Terminal chat client for conversation backends that stream answers over SSE.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod format;
pub mod render;
pub mod session;
pub mod store;
pub mod streaming;
pub mod ui;
pub mod view;

pub use api::{ChatBackend, HttpBackend};
pub use config::Config;
pub use controller::UiController;
pub use error::{ClientError, Result};
