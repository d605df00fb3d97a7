//! Input processing module
//! Handles file type rules, PDF text extraction and the readability gate

pub mod manager;
pub mod text_extractor;

pub use manager::{InputManager, ResumeText};
