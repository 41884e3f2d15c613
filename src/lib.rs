//! orgtree: rebuild a reporting hierarchy from a flat employee list.
//!
//! Layers, innermost first:
//! - [`domain`]: flat records, the arena tree and the hierarchy builder
//! - [`application`]: ingestion, rendering and the load → build → save service
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
