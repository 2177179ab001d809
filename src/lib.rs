pub mod cli;
pub mod config;
pub mod desktop;
pub mod error;
pub mod locator;
pub mod models;
pub mod runs;

pub use error::{AppError, Result};
