//! Inspection lifecycle and compliance engine for fire-safety inspections.
//!
//! The `workflows::inspection` module owns scoring, scheduling, the report state machine, and
//! violation tracking. `workflows::forecasting` holds the deterministic planning forecasts used
//! by the reporting dashboard.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
