//! Route modules for the Verse Notes server

pub mod definitions;
pub mod health;
pub mod highlights;
