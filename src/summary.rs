//! Human-readable rendering of a [`ValidationResult`].
//!
//! Used for logs and the text half of the wire response. The layout is fixed
//! so two renders of the same result are byte-identical.

use std::fmt::{self, Write};

use crate::model::*;

/// Render a multi-line summary.
///
/// ```text
/// INVALID
///   stay: 3-14 nights (rule "Holiday Season" [holiday], season)
///   advance: 0+ days, same-day allowed (defaults)
///   error: Minimum stay not met. Required: 3 nights, Requested: 2 nights
/// ```
pub fn render(result: &ValidationResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_summary(&mut out, result);
    out
}

fn write_summary(out: &mut impl Write, result: &ValidationResult) -> fmt::Result {
    writeln!(out, "{}", if result.is_valid { "VALID" } else { "INVALID" })?;

    let req = &result.requirements;
    write!(out, "  stay: {}", bounds(req.min_stay, req.max_stay, "nights"))?;
    match &result.applied_rules.stay_rule {
        Some(rule) => writeln!(
            out,
            " (rule \"{}\" [{}], {})",
            rule.name,
            rule.id,
            rule.trigger_type.as_str()
        )?,
        None => writeln!(out, " (defaults)")?,
    }

    write!(
        out,
        "  advance: {}, same-day {}",
        bounds(req.min_advance_booking, req.max_advance_booking, "days"),
        if req.last_minute_booking { "allowed" } else { "not allowed" }
    )?;
    match &result.applied_rules.window_rule {
        Some(rule) => writeln!(
            out,
            " (rule \"{}\" [{}], {})",
            rule.name,
            rule.id,
            rule.trigger_type.as_str()
        )?,
        None => writeln!(out, " (defaults)")?,
    }

    for e in &result.errors {
        writeln!(out, "  error: {e}")?;
    }
    for w in &result.warnings {
        writeln!(out, "  warning: {w}")?;
    }
    Ok(())
}

fn bounds(min: u32, max: Option<u32>, unit: &str) -> String {
    match max {
        Some(max) => format!("{min}-{max} {unit}"),
        None => format!("{min}+ {unit}"),
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn result() -> ValidationResult {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        ValidationResult {
            is_valid: false,
            errors: vec!["Minimum stay not met. Required: 3 nights, Requested: 2 nights".into()],
            warnings: vec!["Last-minute booking: additional fees may apply".into()],
            applied_rules: AppliedRules {
                stay_rule: Some(StayRule {
                    id: "holiday".into(),
                    name: "Holiday Season".into(),
                    date_range: DateRange::new(d(12, 20), d(12, 31)),
                    min_stay: 3,
                    max_stay: Some(14),
                    trigger_type: TriggerType::Season,
                    trigger_condition: None,
                    priority: 10,
                    is_active: true,
                    description: None,
                }),
                window_rule: None,
            },
            requirements: Requirements {
                min_stay: 3,
                max_stay: Some(14),
                min_advance_booking: 0,
                max_advance_booking: None,
                last_minute_booking: true,
            },
        }
    }

    #[test]
    fn render_layout() {
        let text = render(&result());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "INVALID");
        assert_eq!(lines[1], "  stay: 3-14 nights (rule \"Holiday Season\" [holiday], season)");
        assert_eq!(lines[2], "  advance: 0+ days, same-day allowed (defaults)");
        assert!(lines[3].starts_with("  error: Minimum stay not met"));
        assert!(lines[4].starts_with("  warning: Last-minute"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn display_matches_render() {
        let r = result();
        assert_eq!(r.to_string(), render(&r));
    }

    #[test]
    fn valid_header() {
        let mut r = result();
        r.is_valid = true;
        r.errors.clear();
        assert!(render(&r).starts_with("VALID\n"));
    }
}
