#![forbid(unsafe_code)]

//! Core domain model and planning engine for the Fastplan system.
//!
//! This crate provides:
//! - Domain types (protocols, fasts, day entries, feelings)
//! - Recurrence expansion and the plan store
//! - Temporal resolution and day-cell spans
//! - Filtering, statistics and the yearly heatmap
//! - Persistence (plan state, config) and export (ICS, CSV)

pub mod types;
pub mod error;
pub mod calendar;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod recurrence;
pub mod plan;
pub mod state;
pub mod temporal;
pub mod day_cell;
pub mod filter;
pub mod stats;
pub mod heatmap;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use calendar::YearMonth;
pub use config::Config;
pub use plan::Plan;
pub use recurrence::{expand, PlanSettings};
pub use temporal::{resolve, TemporalStatus};
pub use day_cell::{resolve_day, DayCell};
pub use filter::Filters;
pub use stats::{summarize, StatsSnapshot};
