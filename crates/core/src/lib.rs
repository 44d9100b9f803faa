//! # Ward Core
//!
//! The bed allocation engine for the ward queueing system.
//!
//! This crate contains the pure allocation logic and its bookkeeping:
//! - An append-only patient registry and a fixed-size bed pool
//! - The allocation pass: strict priority order, FIFO within a priority
//!   class, Emergency-only preemption
//! - JSON snapshot persistence under the configured data directory
//!
//! **No API concerns**: HTTP servers and terminals belong in `ward-run` and
//! `ward-cli`; they consume [`WardService`], the single-writer boundary
//! around the engine.

pub mod allocation;
pub mod beds;
pub mod config;
mod error;
pub mod patient;
pub mod service;
pub mod storage;
pub mod ward;

pub use allocation::PreemptionEvent;
pub use beds::{Bed, BedId, BedStatus, PoolSummary};
pub use config::CoreConfig;
pub use error::{WardError, WardResult};
pub use patient::{Patient, PatientId, PatientStatus, Priority};
pub use service::WardService;
pub use ward::{DailySummary, Ward, WardStats};
