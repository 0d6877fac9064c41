//! Reception seating planner.
//!
//! Reads the RSVP spreadsheet, gives same-named guests distinct identities, seats
//! everyone table by table following a fixed plan, and refuses to produce a chart that
//! breaks table capacity or keeps a group out of its zone. Optionally writes the
//! resulting table labels back to the guest directory.

pub mod config;
pub mod directory;
pub mod display;
pub mod error;
pub mod parser;
pub mod seating;

pub use config::SeatingConfig;
pub use error::{AllocationError, Result};
pub use seating::{plan_seating, SeatingOutcome};
