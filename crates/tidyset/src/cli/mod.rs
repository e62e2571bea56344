//! Command handlers.

pub mod config;
pub mod dupes;
pub mod run;
