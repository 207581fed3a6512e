//! Plumbing shared by the binaries in this workspace.
pub mod completions_command;
pub mod logger;
