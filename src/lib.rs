//! Keeps a log of which window had focus throughout the day and turns it into a daily note.
//! `daynote-logger` records a line whenever the focused window changes, `daynote` exports a
//! day's transcript or has Gemini summarize it.
//!

pub mod cli;
pub mod config;
pub mod daemon;
pub mod error;
pub mod utils;
pub mod window_api;

pub use error::Error;
