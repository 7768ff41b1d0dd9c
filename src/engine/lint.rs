use std::collections::HashSet;

use serde::Serialize;

use crate::model::*;

use super::matcher::PolicyRule;

/// Which rule family a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Family {
    Stay,
    Window,
    Defaults,
}

/// A configuration problem the engine tolerates at evaluation time but an
/// operator should fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigIssue {
    pub family: Family,
    /// Rule id, or `None` for the defaults block.
    pub rule_id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule_id {
            Some(id) => write!(f, "{:?} rule {id}: {}", self.family, self.message),
            None => write!(f, "{:?}: {}", self.family, self.message),
        }
    }
}

/// Audit a rule set. Never fails; an empty list means nothing to report.
pub fn lint_config(config: &RuleSetConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for rule in &config.minimum_stay_rules {
        lint_common(Family::Stay, rule, &mut seen, &mut issues);
        if let Some(max) = rule.max_stay
            && max < rule.min_stay
        {
            issues.push(issue(
                Family::Stay,
                rule.id(),
                format!("maxStay {max} is below minStay {}; treated as no maximum", rule.min_stay),
            ));
        }
        if rule.min_stay == 0 {
            issues.push(issue(Family::Stay, rule.id(), "minStay is 0".into()));
        }
    }

    let mut seen = HashSet::new();
    for rule in &config.booking_window_rules {
        lint_common(Family::Window, rule, &mut seen, &mut issues);
        if let Some(max) = rule.max_advance_booking
            && max < rule.min_advance_booking
        {
            issues.push(issue(
                Family::Window,
                rule.id(),
                format!(
                    "maxAdvanceBooking {max} is below minAdvanceBooking {}; treated as no maximum",
                    rule.min_advance_booking
                ),
            ));
        }
    }

    let defaults = &config.defaults;
    if defaults.min_stay == 0 {
        issues.push(ConfigIssue {
            family: Family::Defaults,
            rule_id: None,
            message: "minStay must be at least 1".into(),
        });
    }
    if let Some(max) = defaults.max_stay
        && max < defaults.min_stay
    {
        issues.push(ConfigIssue {
            family: Family::Defaults,
            rule_id: None,
            message: format!("maxStay {max} is below minStay {}", defaults.min_stay),
        });
    }
    if let Some(max) = defaults.max_advance_booking
        && max < defaults.min_advance_booking
    {
        issues.push(ConfigIssue {
            family: Family::Defaults,
            rule_id: None,
            message: format!(
                "maxAdvanceBooking {max} is below minAdvanceBooking {}",
                defaults.min_advance_booking
            ),
        });
    }

    issues
}

fn lint_common<'a, R: PolicyRule>(
    family: Family,
    rule: &'a R,
    seen: &mut HashSet<&'a str>,
    issues: &mut Vec<ConfigIssue>,
) {
    if !seen.insert(rule.id()) {
        issues.push(issue(family, rule.id(), "duplicate identifier".into()));
    }
    let range = rule.date_range();
    if range.is_inverted() {
        issues.push(issue(
            family,
            rule.id(),
            format!("date range ends ({}) before it starts ({})", range.end, range.start),
        ));
    }

    let condition = rule.trigger_condition();
    match rule.trigger_type() {
        TriggerType::Demand => {
            if condition.and_then(|c| c.demand_level).is_none() {
                issues.push(issue(
                    family,
                    rule.id(),
                    "demand trigger without demandLevel applies on dates alone".into(),
                ));
            }
        }
        TriggerType::Occupancy => match condition.and_then(|c| c.occupancy_threshold) {
            None => issues.push(issue(
                family,
                rule.id(),
                "occupancy trigger without occupancyThreshold applies on dates alone".into(),
            )),
            Some(t) if !(0.0..=100.0).contains(&t) => issues.push(issue(
                family,
                rule.id(),
                format!("occupancyThreshold {t} is outside 0-100"),
            )),
            Some(_) => {}
        },
        TriggerType::Season | TriggerType::Event | TriggerType::Custom => {}
    }
}

fn issue(family: Family, id: &str, message: String) -> ConfigIssue {
    ConfigIssue {
        family,
        rule_id: Some(id.to_string()),
        message,
    }
}
