pub mod config;
pub mod error;
pub mod forge;
pub mod git;
pub mod llm;
pub mod log;
pub mod settings;
pub mod util;

// Decoupled game loop architecture
pub mod app;
pub mod render;
pub mod tea;
pub mod ui;

pub use error::{Error, Result};
