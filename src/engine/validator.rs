use crate::model::*;

/// Check a booking against resolved requirements.
///
/// Errors accumulate; a booking can fail both stay bounds and the window at
/// once. `applied_rules` is left empty for the caller to fill.
pub fn validate(booking: &BookingRequest, req: &Requirements) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    check_stay_length(booking.nights(), req, &mut errors);
    check_booking_window(booking.advance_days(), req, &mut errors, &mut warnings);

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        applied_rules: AppliedRules::default(),
        requirements: req.clone(),
    }
}

fn check_stay_length(nights: i64, req: &Requirements, errors: &mut Vec<String>) {
    if nights <= 0 {
        errors.push("Check-out date must be after check-in date".to_string());
        return;
    }
    if nights < i64::from(req.min_stay) {
        errors.push(format!(
            "Minimum stay not met. Required: {} nights, Requested: {nights} nights",
            req.min_stay
        ));
    }
    if let Some(max) = req.max_stay
        && nights > i64::from(max)
    {
        errors.push(format!(
            "Maximum stay exceeded. Allowed: {max} nights, Requested: {nights} nights"
        ));
    }
}

fn check_booking_window(
    advance: i64,
    req: &Requirements,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if advance < 0 {
        errors.push("Booking date is after the check-in date".to_string());
        return;
    }

    if advance == 0 {
        // Same-day gets its own message; when allowed it skips the minimum entirely.
        if !req.last_minute_booking {
            errors.push("Same-day bookings are not allowed for these dates".to_string());
        }
    } else if advance < i64::from(req.min_advance_booking) {
        errors.push(format!(
            "Bookings must be made at least {} days in advance. Requested: {advance} days ahead",
            req.min_advance_booking
        ));
    }

    if let Some(max) = req.max_advance_booking
        && advance > i64::from(max)
    {
        errors.push(format!(
            "Booked too far ahead. Bookings open at most {max} days before check-in. Requested: {advance} days ahead"
        ));
    }

    if advance <= 1 && req.min_advance_booking > 1 {
        warnings.push("Last-minute booking: additional fees may apply".to_string());
    }
    // advance > 80% of max, kept in integers so results never depend on float rounding.
    if let Some(max) = req.max_advance_booking
        && advance * 5 > i64::from(max) * 4
    {
        warnings.push(
            "Booking far in advance: policies may change before arrival".to_string(),
        );
    }
}
