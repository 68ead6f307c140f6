//! riddlectl library - command implementations, exposed for testing.

pub mod cli;
pub mod commands;
pub mod output;
