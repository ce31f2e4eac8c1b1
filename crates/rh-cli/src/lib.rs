//! roamhost CLI
//!
//! Runs a coordinator in the foreground, sends single request lines to
//! coordinators and sessions, and manages the configuration file.

pub mod commands;
pub mod output;
