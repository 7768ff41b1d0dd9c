//! Stay-length and booking-window rule engine.
//!
//! The engine ([`engine::validate_booking`]) is a pure function over a
//! property's [`model::RuleSetConfig`], a [`model::BookingRequest`] and any
//! occupancy samples for the stay. Everything else in the crate hosts it:
//! a per-property config cache, a line-delimited JSON protocol, and metrics.

pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod protocol;
pub mod store;
pub mod summary;
pub mod wire;

pub use engine::{applicable_rules_for_period, lint_config, validate_booking};
