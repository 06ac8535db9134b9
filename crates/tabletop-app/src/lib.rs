//! Tabletop Application
//!
//! Headless client that joins a table over the relay and follows its state.

pub mod app;
pub mod renderer;

pub use app::{App, AppConfig, AppError};
pub use renderer::{FrameSummary, LogRenderer};
