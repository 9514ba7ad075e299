//! Reset scheduling
//!
//! This module provides:
//! - **Events**: the one-shot per-instance expiry and the recurring
//!   warn/warn/warn/reset sequence for global resets
//! - **Queue**: a fire-time-ordered queue with stable tie-break and
//!   best-effort cancellation
//! - **Period math**: daily, weekly, and whole-day-period next-reset
//!   computation

mod event;
mod period;
mod queue;

pub use event::{ResetEvent, ResetEventKind};
pub use period::{
    ResetCadence, next_daily_reset, next_periodic_reset, next_reset, next_weekly_reset,
    reset_period,
};
pub use queue::ResetQueue;
