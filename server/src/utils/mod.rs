//! Utility functions for the application

pub mod file;
pub mod html;
pub mod terminal;
pub mod time;
