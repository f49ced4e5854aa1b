use serde::{Deserialize, Serialize};

use super::geometry::DimensionLimiter;

/// The legacy size and placement hints a client declares.
///
/// Pairs are `(width, height)`. Every field is optional; a client that sets
/// nothing gets increment 1 and base 0 on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeHints {
    pub min: Option<(i32, i32)>,
    pub max: Option<(i32, i32)>,
    pub base: Option<(i32, i32)>,
    pub increment: Option<(i32, i32)>,
    pub user_position: bool,
    pub program_position: bool,
}

impl SizeHints {
    /// The client asked to be placed where it said, not auto-placed.
    pub fn has_position(&self) -> bool { self.user_position || self.program_position }

    pub fn limiters(&self) -> (DimensionLimiter, DimensionLimiter) {
        let pick = |pair: Option<(i32, i32)>, horizontal: bool| {
            pair.map(|(w, h)| if horizontal { w } else { h })
        };
        let axis = |horizontal: bool| {
            derive_limiter(
                pick(self.min, horizontal),
                pick(self.max, horizontal),
                pick(self.base, horizontal),
                pick(self.increment, horizontal),
            )
        };
        (axis(true), axis(false))
    }
}

fn derive_limiter(
    min: Option<i32>,
    max: Option<i32>,
    base: Option<i32>,
    increment: Option<i32>,
) -> DimensionLimiter {
    let min = min.filter(|&v| v > 0);
    let base = base.filter(|&v| v >= 0);

    let resolved_min = min.or(base).unwrap_or(1).max(1);
    let resolved_base = base.or(min).unwrap_or(0);
    let max = max.filter(|&v| v > 0).map(|v| v.max(resolved_min));
    let mut increment = increment.filter(|&v| v > 0).unwrap_or(1);

    // Declared min == max pins the axis for good.
    if let (Some(min), Some(max)) = (min, max)
        && min == max
    {
        increment = 0;
    }

    DimensionLimiter {
        min: resolved_min,
        max,
        base: resolved_base,
        increment,
    }
}
