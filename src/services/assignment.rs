//! Best-driver selection for a pickup time. Pure: the caller flips
//! the chosen driver to busy via the store.

use chrono::NaiveDateTime;

use crate::models::{Driver, DriverStatus};

pub const DEFAULT_CANDIDATE_POOL: usize = 5;

/// Pick the best available driver for the pickup time, or `None` when
/// nobody qualifies. An empty result is an expected outcome, not an
/// error; the caller decides whether to queue or retry.
pub fn assign<'a>(
    pickup: &NaiveDateTime,
    drivers: &'a [Driver],
    candidate_pool: usize,
) -> Option<&'a Driver> {
    let mut candidates: Vec<&Driver> = drivers
        .iter()
        .filter(|d| d.status == DriverStatus::Available)
        .filter(|d| d.covers(pickup))
        .collect();

    candidates.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(candidate_pool.max(1));
    candidates.first().copied()
}
