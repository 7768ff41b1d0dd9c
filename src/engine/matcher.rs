use std::cmp::Ordering;

use crate::model::*;

use super::conditions::StayConditions;

/// Shared view over the two rule families so matching is written once.
pub trait PolicyRule {
    fn id(&self) -> &str;
    fn priority(&self) -> i32;
    fn is_active(&self) -> bool;
    fn date_range(&self) -> &DateRange;
    fn trigger_type(&self) -> TriggerType;
    fn trigger_condition(&self) -> Option<&TriggerCondition>;
}

impl PolicyRule for StayRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn priority(&self) -> i32 {
        self.priority
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn date_range(&self) -> &DateRange {
        &self.date_range
    }
    fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }
    fn trigger_condition(&self) -> Option<&TriggerCondition> {
        self.trigger_condition.as_ref()
    }
}

impl PolicyRule for WindowRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn priority(&self) -> i32 {
        self.priority
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn date_range(&self) -> &DateRange {
        &self.date_range
    }
    fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }
    fn trigger_condition(&self) -> Option<&TriggerCondition> {
        self.trigger_condition.as_ref()
    }
}

/// Does the rule's date range touch the stay?
///
/// Three ways in: check-in inside the range, check-out inside the range, or
/// the whole range enclosed by the stay. Range bounds are inclusive.
pub fn dates_apply(range: &DateRange, check_in: Day, check_out: Day) -> bool {
    range.contains(check_in) || range.contains(check_out) || range.enclosed_by(check_in, check_out)
}

/// Priority descending, then identifier ascending.
pub fn by_precedence<R: PolicyRule>(a: &R, b: &R) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| a.id().cmp(b.id()))
}

/// Highest-precedence rule that is active, overlaps the stay, and whose
/// trigger holds. `None` means the caller falls back to defaults.
pub fn find_applicable_rule<'a, R: PolicyRule>(
    rules: &'a [R],
    booking: &BookingRequest,
    conditions: &StayConditions,
) -> Option<&'a R> {
    let mut candidates: Vec<&R> = rules
        .iter()
        .filter(|r| r.is_active())
        .filter(|r| dates_apply(r.date_range(), booking.check_in, booking.check_out))
        .filter(|r| conditions.satisfies(r.trigger_type(), r.trigger_condition()))
        .collect();
    candidates.sort_by(|a, b| by_precedence(*a, *b));
    candidates.into_iter().next()
}

/// Every active rule overlapping `[start, end]`, in precedence order.
/// Triggers are not evaluated.
pub fn rules_overlapping<R: PolicyRule + Clone>(rules: &[R], start: Day, end: Day) -> Vec<R> {
    let mut hits: Vec<R> = rules
        .iter()
        .filter(|r| r.is_active() && dates_apply(r.date_range(), start, end))
        .cloned()
        .collect();
    hits.sort_by(by_precedence);
    hits
}
