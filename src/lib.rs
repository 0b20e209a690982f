//! Client-side interaction layer for a sentiment-analysis backend: panel
//! navigation, request lifecycle, session state, and a bounded history.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod history;
pub mod logging;
pub mod shell;
pub mod ui;
