//! Fuzzification of sensor distances.
//!
//! Each sensor distance is mapped onto three linguistic terms by piecewise-linear
//! membership functions built from four breakpoints `a ≤ b ≤ c ≤ d`:
//!
//! ```text
//!  1 ┤ Near ──╮      ╭─ Medium ─╮      ╭── Far
//!    │         ╲    ╱            ╲    ╱
//!    │          ╲  ╱              ╲  ╱
//!  0 ┤           ╳                  ╳
//!    └─────────a────b────────────c────d──────▶ distance
//! ```
//!
//! `Near` is a left shoulder, `Medium` a trapezoid and `Far` a right shoulder. The three
//! degrees always sum to 1 for well-formed breakpoints. Breakpoints are sorted before use,
//! so any ordering produced by crossover or mutation still describes valid functions.

use serde::{Deserialize, Serialize};

use crate::rules::VERTICES_PER_SENSOR;

/// Number of linguistic terms per sensor input.
pub const SENSOR_TERM_COUNT: usize = 3;

/// Linguistic terms of a sensor distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
pub enum SensorTerm {
    Near,
    Medium,
    Far,
}

impl SensorTerm {
    pub const ALL: [Self; SENSOR_TERM_COUNT] = [Self::Near, Self::Medium, Self::Far];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Membership degrees of one input, indexed by [`SensorTerm::index`].
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Memberships(pub [f32; SENSOR_TERM_COUNT]);

impl Memberships {
    #[must_use]
    pub fn degree(&self, term: SensorTerm) -> f32 {
        self.0[term.index()]
    }

    /// Term with the highest degree (first one on ties).
    #[must_use]
    pub fn dominant(&self) -> SensorTerm {
        let mut best = SensorTerm::Near;
        for term in SensorTerm::ALL {
            if self.degree(term) > self.degree(best) {
                best = term;
            }
        }
        best
    }
}

/// Fuzzifies `distance` with the given breakpoints.
#[must_use]
pub fn fuzzify(distance: f32, vertices: [f32; VERTICES_PER_SENSOR]) -> Memberships {
    let mut v = vertices;
    v.sort_by(f32::total_cmp);
    let [a, b, c, d] = v;
    let x = distance;

    let near = if x <= a {
        1.0
    } else if x >= b {
        0.0
    } else {
        (b - x) / (b - a)
    };
    let medium = if x <= a || x >= d {
        0.0
    } else if x < b {
        (x - a) / (b - a)
    } else if x <= c {
        1.0
    } else {
        (d - x) / (d - c)
    };
    let far = if x <= c {
        0.0
    } else if x >= d {
        1.0
    } else {
        (x - c) / (d - c)
    };

    Memberships([near, medium, far])
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTICES: [f32; 4] = [2.0, 4.0, 8.0, 12.0];

    fn assert_close(actual: Memberships, expected: [f32; 3]) {
        for (a, e) in actual.0.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_shoulders_and_plateau() {
        assert_close(fuzzify(0.0, VERTICES), [1.0, 0.0, 0.0]);
        assert_close(fuzzify(6.0, VERTICES), [0.0, 1.0, 0.0]);
        assert_close(fuzzify(20.0, VERTICES), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_slopes() {
        assert_close(fuzzify(3.0, VERTICES), [0.5, 0.5, 0.0]);
        assert_close(fuzzify(11.0, VERTICES), [0.0, 0.25, 0.75]);
    }

    #[test]
    fn test_degrees_sum_to_one() {
        for i in 0..=150 {
            #[expect(clippy::cast_precision_loss)]
            let x = i as f32 * 0.1;
            let m = fuzzify(x, VERTICES);
            let sum: f32 = m.0.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "x = {x}: {m:?}");
        }
    }

    #[test]
    fn test_unsorted_vertices_are_sorted() {
        let shuffled = [8.0, 2.0, 12.0, 4.0];
        assert_eq!(fuzzify(3.0, shuffled), fuzzify(3.0, VERTICES));
    }

    #[test]
    fn test_degenerate_vertices_do_not_divide_by_zero() {
        let collapsed = [5.0; 4];
        for x in [0.0, 5.0, 10.0] {
            let m = fuzzify(x, collapsed);
            assert!(m.0.iter().all(|v| v.is_finite()));
        }
        assert_eq!(fuzzify(10.0, collapsed).dominant(), SensorTerm::Far);
        assert_eq!(fuzzify(0.0, collapsed).dominant(), SensorTerm::Near);
    }
}
