/// Longest property id accepted (also the config file stem).
pub const MAX_PROPERTY_ID_LEN: usize = 128;

/// Rule sets kept in the in-memory cache at once.
pub const MAX_PROPERTIES: usize = 10_000;

/// Rules per family in a single rule set.
pub const MAX_RULES_PER_FAMILY: usize = 1_000;

/// Occupancy samples accepted with one request.
pub const MAX_OCCUPANCY_SAMPLES: usize = 3_660;

/// Longest request line, in bytes.
pub const MAX_LINE_LEN: usize = 4 * 1024 * 1024;

/// Widest period accepted by `rulesForPeriod`, in days.
pub const MAX_PERIOD_DAYS: i64 = 3_660;
