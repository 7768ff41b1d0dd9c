use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Calendar day, the only time type. No time-of-day, no zone.
pub type Day = NaiveDate;

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: Day, to: Day) -> i64 {
    (to - from).num_days()
}

/// Inclusive range of calendar days `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Day,
    pub end: Day,
}

impl DateRange {
    pub fn new(start: Day, end: Day) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day <= self.end
    }

    /// True when the whole range sits strictly inside `(check_in, check_out)`.
    pub fn enclosed_by(&self, check_in: Day, check_out: Day) -> bool {
        check_in < self.start && check_out > self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

// ── Triggers ─────────────────────────────────────────────────────

/// What activates a rule beyond its date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Season,
    Demand,
    Occupancy,
    Event,
    Custom,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Season => "season",
            TriggerType::Demand => "demand",
            TriggerType::Occupancy => "occupancy",
            TriggerType::Event => "event",
            TriggerType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandLevel {
    Low,
    Medium,
    High,
}

impl DemandLevel {
    pub const ALL: [DemandLevel; 3] = [DemandLevel::Low, DemandLevel::Medium, DemandLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemandLevel::Low => "low",
            DemandLevel::Medium => "medium",
            DemandLevel::High => "high",
        }
    }
}

/// Condition attached to a trigger. Only the field matching the rule's
/// trigger type is ever consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_level: Option<DemandLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

// ── Rules ────────────────────────────────────────────────────────

/// Minimum/maximum length-of-stay policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayRule {
    pub id: String,
    pub name: String,
    pub date_range: DateRange,
    pub min_stay: u32,
    #[serde(default)]
    pub max_stay: Option<u32>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_condition: Option<TriggerCondition>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Advance-booking window policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowRule {
    pub id: String,
    pub name: String,
    pub date_range: DateRange,
    pub min_advance_booking: u32,
    #[serde(default)]
    pub max_advance_booking: Option<u32>,
    #[serde(default = "default_true")]
    pub last_minute_booking: bool,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_condition: Option<TriggerCondition>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Property-wide fallback when no rule of a family matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRequirements {
    pub min_stay: u32,
    #[serde(default)]
    pub max_stay: Option<u32>,
    #[serde(default)]
    pub min_advance_booking: u32,
    #[serde(default)]
    pub max_advance_booking: Option<u32>,
    #[serde(default = "default_true")]
    pub last_minute_booking: bool,
}

impl Default for DefaultRequirements {
    fn default() -> Self {
        Self {
            min_stay: 1,
            max_stay: None,
            min_advance_booking: 0,
            max_advance_booking: None,
            last_minute_booking: true,
        }
    }
}

/// A property's full rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetConfig {
    pub enabled: bool,
    #[serde(default)]
    pub minimum_stay_rules: Vec<StayRule>,
    #[serde(default)]
    pub booking_window_rules: Vec<WindowRule>,
    #[serde(default)]
    pub defaults: DefaultRequirements,
}

// ── Inputs ───────────────────────────────────────────────────────

/// One day of occupancy/demand data for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySample {
    pub date: Day,
    /// Percentage, 0–100.
    pub occupancy_rate: f64,
    pub demand_level: DemandLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub check_in: Day,
    pub check_out: Day,
    pub booking_date: Day,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub property_id: String,
}

fn default_guests() -> u32 {
    1
}

impl BookingRequest {
    /// Nights between check-in and check-out. Zero or negative for a bad span.
    pub fn nights(&self) -> i64 {
        days_between(self.check_in, self.check_out)
    }

    /// Days between booking and check-in. Negative if booked after check-in.
    pub fn advance_days(&self) -> i64 {
        days_between(self.booking_date, self.check_in)
    }
}

// ── Results ──────────────────────────────────────────────────────

/// Effective requirements after rule matching and default fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub min_stay: u32,
    pub max_stay: Option<u32>,
    pub min_advance_booking: u32,
    pub max_advance_booking: Option<u32>,
    pub last_minute_booking: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRules {
    pub stay_rule: Option<StayRule>,
    pub window_rule: Option<WindowRule>,
}

impl AppliedRules {
    pub fn is_empty(&self) -> bool {
        self.stay_rule.is_none() && self.window_rule.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub applied_rules: AppliedRules,
    pub requirements: Requirements,
}

/// Every active rule overlapping a period, for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesForPeriod {
    pub stay_rules: Vec<StayRule>,
    pub window_rules: Vec<WindowRule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Day {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_range_contains_is_inclusive() {
        let r = DateRange::new(d(2024, 12, 20), d(2025, 1, 2));
        assert!(r.contains(d(2024, 12, 20)));
        assert!(r.contains(d(2025, 1, 2)));
        assert!(r.contains(d(2024, 12, 31)));
        assert!(!r.contains(d(2024, 12, 19)));
        assert!(!r.contains(d(2025, 1, 3)));
    }

    #[test]
    fn date_range_enclosed_is_strict() {
        let r = DateRange::new(d(2024, 6, 10), d(2024, 6, 12));
        assert!(r.enclosed_by(d(2024, 6, 9), d(2024, 6, 13)));
        // touching either edge is not enclosure
        assert!(!r.enclosed_by(d(2024, 6, 10), d(2024, 6, 13)));
        assert!(!r.enclosed_by(d(2024, 6, 9), d(2024, 6, 12)));
    }

    #[test]
    fn inverted_range_detected() {
        assert!(DateRange::new(d(2024, 6, 12), d(2024, 6, 10)).is_inverted());
        assert!(!DateRange::new(d(2024, 6, 10), d(2024, 6, 10)).is_inverted());
    }

    #[test]
    fn days_between_across_year_boundary() {
        assert_eq!(days_between(d(2024, 12, 30), d(2025, 1, 1)), 2);
        assert_eq!(days_between(d(2025, 1, 1), d(2024, 12, 30)), -2);
        assert_eq!(days_between(d(2024, 2, 28), d(2024, 3, 1)), 2); // leap year
    }

    #[test]
    fn booking_nights_and_advance() {
        let b = BookingRequest {
            check_in: d(2024, 7, 10),
            check_out: d(2024, 7, 14),
            booking_date: d(2024, 7, 1),
            guests: 2,
            property_id: "p1".into(),
        };
        assert_eq!(b.nights(), 4);
        assert_eq!(b.advance_days(), 9);
    }

    #[test]
    fn demand_levels_are_ordered() {
        assert!(DemandLevel::Low < DemandLevel::Medium);
        assert!(DemandLevel::Medium < DemandLevel::High);
    }

    #[test]
    fn stay_rule_deserializes_from_camel_case() {
        let json = r#"{
            "id": "xmas",
            "name": "Holiday Season",
            "dateRange": { "start": "2024-12-20", "end": "2025-01-02" },
            "minStay": 3,
            "triggerType": "season",
            "priority": 10
        }"#;
        let rule: StayRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "xmas");
        assert_eq!(rule.min_stay, 3);
        assert_eq!(rule.max_stay, None);
        assert_eq!(rule.trigger_type, TriggerType::Season);
        assert!(rule.is_active); // defaults to active
        assert_eq!(rule.date_range.start, d(2024, 12, 20));
    }

    #[test]
    fn trigger_condition_deserializes() {
        let json = r#"{
            "id": "busy",
            "name": "Busy",
            "dateRange": { "start": "2024-01-01", "end": "2024-12-31" },
            "minAdvanceBooking": 2,
            "lastMinuteBooking": false,
            "triggerType": "occupancy",
            "triggerCondition": { "occupancyThreshold": 80 },
            "priority": 1,
            "isActive": true
        }"#;
        let rule: WindowRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.trigger_type, TriggerType::Occupancy);
        let cond = rule.trigger_condition.unwrap();
        assert_eq!(cond.occupancy_threshold, Some(80.0));
        assert_eq!(cond.demand_level, None);
        assert!(!rule.last_minute_booking);
    }

    #[test]
    fn rule_set_defaults_when_omitted() {
        let cfg: RuleSetConfig = serde_json::from_str(r#"{ "enabled": true }"#).unwrap();
        assert!(cfg.minimum_stay_rules.is_empty());
        assert!(cfg.booking_window_rules.is_empty());
        assert_eq!(cfg.defaults, DefaultRequirements::default());
    }

    #[test]
    fn applied_rules_empty() {
        assert!(AppliedRules::default().is_empty());
    }
}
