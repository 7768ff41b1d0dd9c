use std::collections::BTreeMap;

use crate::model::*;

/// Demand and occupancy signals aggregated over the nights of one stay.
///
/// Computed once per evaluation and shared by both rule families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StayConditions {
    /// Most frequent demand level; `Medium` when no samples cover the stay.
    pub demand_mode: DemandLevel,
    /// Mean occupancy rate; `None` when no samples cover the stay.
    pub mean_occupancy: Option<f64>,
    /// Number of stay nights that had a sample.
    pub samples: usize,
}

impl StayConditions {
    /// Aggregate samples dated on a night of the stay: `[check_in, check_out)`.
    ///
    /// Each night counts once. When a feed repeats a date, the sample that
    /// comes last in the slice is the one used.
    pub fn for_stay(booking: &BookingRequest, samples: &[OccupancySample]) -> Self {
        let nights: BTreeMap<Day, &OccupancySample> = samples
            .iter()
            .filter(|s| booking.check_in <= s.date && s.date < booking.check_out)
            .map(|s| (s.date, s))
            .collect();

        let mut counts = [0usize; 3];
        let mut total_rate = 0.0;
        for s in nights.values() {
            counts[level_index(s.demand_level)] += 1;
            total_rate += s.occupancy_rate;
        }
        let n = nights.len();

        Self {
            demand_mode: demand_mode(&counts),
            mean_occupancy: (n > 0).then(|| total_rate / n as f64),
            samples: n,
        }
    }

    /// Whether a rule's trigger holds for this stay.
    ///
    /// A rule without a condition (or without the field its trigger type
    /// reads) applies whenever its dates match.
    pub fn satisfies(&self, trigger: TriggerType, condition: Option<&TriggerCondition>) -> bool {
        let Some(condition) = condition else {
            return true;
        };
        match trigger {
            TriggerType::Season | TriggerType::Event | TriggerType::Custom => true,
            TriggerType::Demand => match condition.demand_level {
                Some(level) => level == self.demand_mode,
                None => true,
            },
            TriggerType::Occupancy => match condition.occupancy_threshold {
                // No data: cannot confirm the threshold, so the rule stays off.
                Some(threshold) => self.mean_occupancy.is_some_and(|mean| mean >= threshold),
                None => true,
            },
        }
    }
}

fn level_index(level: DemandLevel) -> usize {
    match level {
        DemandLevel::Low => 0,
        DemandLevel::Medium => 1,
        DemandLevel::High => 2,
    }
}

/// Ties resolve toward the higher demand level.
fn demand_mode(counts: &[usize; 3]) -> DemandLevel {
    let mut best = DemandLevel::Medium;
    let mut best_count = 0;
    // High → Low, strict `>` keeps the higher level on ties.
    for level in DemandLevel::ALL.into_iter().rev() {
        let count = counts[level_index(level)];
        if count > best_count {
            best = level;
            best_count = count;
        }
    }
    best
}
