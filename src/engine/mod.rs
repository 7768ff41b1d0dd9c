mod conditions;
mod lint;
mod matcher;
mod validator;

pub use conditions::StayConditions;
pub use lint::{ConfigIssue, Family, lint_config};
pub use matcher::{PolicyRule, by_precedence, dates_apply, find_applicable_rule, rules_overlapping};
pub use validator::validate;

use tracing::{debug, warn};

use crate::model::*;

/// Resolve which rules govern a booking and validate it against them.
///
/// Pure apart from logging: no clock, no I/O. Identical inputs produce
/// identical results.
pub fn validate_booking(
    booking: &BookingRequest,
    config: &RuleSetConfig,
    occupancy: &[OccupancySample],
) -> ValidationResult {
    let mut req = from_defaults(&config.defaults);

    if !config.enabled {
        debug!(property = %booking.property_id, "rules disabled, defaults only");
        return validator::validate(booking, &req);
    }

    let conditions = StayConditions::for_stay(booking, occupancy);
    debug!(
        property = %booking.property_id,
        demand = conditions.demand_mode.as_str(),
        occupancy = ?conditions.mean_occupancy,
        samples = conditions.samples,
        "stay conditions"
    );

    // Families are matched independently; each only overrides its own fields.
    let stay_rule = find_applicable_rule(&config.minimum_stay_rules, booking, &conditions);
    if let Some(rule) = stay_rule {
        debug!(rule = %rule.id, priority = rule.priority, "stay rule applied");
        req.min_stay = rule.min_stay;
        req.max_stay = checked_max(rule.max_stay, rule.min_stay, &rule.id, "maxStay");
    }

    let window_rule = find_applicable_rule(&config.booking_window_rules, booking, &conditions);
    if let Some(rule) = window_rule {
        debug!(rule = %rule.id, priority = rule.priority, "window rule applied");
        req.min_advance_booking = rule.min_advance_booking;
        req.max_advance_booking = checked_max(
            rule.max_advance_booking,
            rule.min_advance_booking,
            &rule.id,
            "maxAdvanceBooking",
        );
        req.last_minute_booking = rule.last_minute_booking;
    }

    let mut result = validator::validate(booking, &req);
    result.applied_rules = AppliedRules {
        stay_rule: stay_rule.cloned(),
        window_rule: window_rule.cloned(),
    };
    result
}

/// All active rules whose dates overlap `[start, end]`, highest precedence
/// first. Triggers are not evaluated; this is for display, not enforcement.
pub fn applicable_rules_for_period(start: Day, end: Day, config: &RuleSetConfig) -> RulesForPeriod {
    if !config.enabled {
        return RulesForPeriod::default();
    }
    RulesForPeriod {
        stay_rules: rules_overlapping(&config.minimum_stay_rules, start, end),
        window_rules: rules_overlapping(&config.booking_window_rules, start, end),
    }
}

fn from_defaults(defaults: &DefaultRequirements) -> Requirements {
    Requirements {
        min_stay: defaults.min_stay,
        max_stay: checked_max(defaults.max_stay, defaults.min_stay, "defaults", "maxStay"),
        min_advance_booking: defaults.min_advance_booking,
        max_advance_booking: checked_max(
            defaults.max_advance_booking,
            defaults.min_advance_booking,
            "defaults",
            "maxAdvanceBooking",
        ),
        last_minute_booking: defaults.last_minute_booking,
    }
}

/// A maximum below its minimum is malformed; treat it as no upper bound
/// rather than rejecting the whole configuration.
fn checked_max(max: Option<u32>, min: u32, source: &str, field: &'static str) -> Option<u32> {
    match max {
        Some(m) if m < min => {
            warn!(source, field, max = m, min, "maximum below minimum, ignoring");
            None
        }
        other => other,
    }
}
