//! The fixed rule base shared by every controller.
//!
//! There is one rule for each combination of left, front and right sensor terms, 27 in
//! total, indexed `left * 9 + front * 3 + right`. The consequent of each rule is fixed;
//! evolution only tunes how strongly a rule fires (its weight) and where its output term
//! sits (the term centre).
//!
//! Steering: the balance `left - right` (in term steps) selects the term on the scale
//! `HardRight, Right, Straight, Left, HardLeft`, turning toward the more open side. A
//! `Near` front pushes one more step toward that side, and turns `Left` when both sides
//! are equally open.
//!
//! Velocity: `Slow` whenever the front is `Near`; `Fast` for a `Far` front with no `Near`
//! side; `Slow` for a `Medium` front with a `Near` side; `Cruise` otherwise.

use crate::membership::{SENSOR_TERM_COUNT, SensorTerm};

/// Number of rules.
pub const RULE_COUNT: usize = SENSOR_TERM_COUNT * SENSOR_TERM_COUNT * SENSOR_TERM_COUNT;

/// Steering output terms, in ascending order of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SteeringTerm {
    HardRight,
    Right,
    Straight,
    Left,
    HardLeft,
}

impl SteeringTerm {
    pub const ALL: [Self; 5] = [
        Self::HardRight,
        Self::Right,
        Self::Straight,
        Self::Left,
        Self::HardLeft,
    ];
}

/// Velocity output terms, in ascending order of speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum VelocityTerm {
    Slow,
    Cruise,
    Fast,
}

impl VelocityTerm {
    pub const ALL: [Self; 3] = [Self::Slow, Self::Cruise, Self::Fast];
}

/// Inputs of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInputs {
    pub left: SensorTerm,
    pub front: SensorTerm,
    pub right: SensorTerm,
}

impl RuleInputs {
    #[must_use]
    pub const fn index(self) -> usize {
        self.left.index() * SENSOR_TERM_COUNT * SENSOR_TERM_COUNT
            + self.front.index() * SENSOR_TERM_COUNT
            + self.right.index()
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self {
            left: term_at(index / (SENSOR_TERM_COUNT * SENSOR_TERM_COUNT)),
            front: term_at(index / SENSOR_TERM_COUNT),
            right: term_at(index),
        }
    }
}

const fn term_at(digit: usize) -> SensorTerm {
    match digit % SENSOR_TERM_COUNT {
        0 => SensorTerm::Near,
        1 => SensorTerm::Medium,
        _ => SensorTerm::Far,
    }
}

/// Steering consequent of each rule, as an index into [`SteeringTerm::ALL`].
pub const STEERING_CONSEQUENTS: [usize; RULE_COUNT] = {
    let mut table = [0; RULE_COUNT];
    let mut i = 0;
    while i < RULE_COUNT {
        table[i] = steering_consequent(RuleInputs::from_index(i)) as usize;
        i += 1;
    }
    table
};

/// Velocity consequent of each rule, as an index into [`VelocityTerm::ALL`].
pub const VELOCITY_CONSEQUENTS: [usize; RULE_COUNT] = {
    let mut table = [0; RULE_COUNT];
    let mut i = 0;
    while i < RULE_COUNT {
        table[i] = velocity_consequent(RuleInputs::from_index(i)) as usize;
        i += 1;
    }
    table
};

#[expect(clippy::cast_possible_wrap)]
const fn steering_consequent(inputs: RuleInputs) -> SteeringTerm {
    let balance = inputs.left.index() as isize - inputs.right.index() as isize;
    let mut scale = 2 + balance;
    if matches!(inputs.front, SensorTerm::Near) {
        scale += if balance == 0 { 1 } else { balance.signum() };
    }
    match scale {
        ..=0 => SteeringTerm::HardRight,
        1 => SteeringTerm::Right,
        2 => SteeringTerm::Straight,
        3 => SteeringTerm::Left,
        _ => SteeringTerm::HardLeft,
    }
}

const fn velocity_consequent(inputs: RuleInputs) -> VelocityTerm {
    let side_near =
        matches!(inputs.left, SensorTerm::Near) || matches!(inputs.right, SensorTerm::Near);
    match inputs.front {
        SensorTerm::Near => VelocityTerm::Slow,
        SensorTerm::Medium if side_near => VelocityTerm::Slow,
        SensorTerm::Far if !side_near => VelocityTerm::Fast,
        SensorTerm::Medium | SensorTerm::Far => VelocityTerm::Cruise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(left: SensorTerm, front: SensorTerm, right: SensorTerm) -> RuleInputs {
        RuleInputs { left, front, right }
    }

    #[test]
    fn test_index_roundtrip() {
        for i in 0..RULE_COUNT {
            assert_eq!(RuleInputs::from_index(i).index(), i);
        }
    }

    #[test]
    fn test_steering_turns_toward_open_side() {
        use SensorTerm::{Far, Medium, Near};
        let steer = |i: RuleInputs| SteeringTerm::ALL[STEERING_CONSEQUENTS[i.index()]];
        assert_eq!(steer(inputs(Far, Far, Far)), SteeringTerm::Straight);
        assert_eq!(steer(inputs(Far, Far, Near)), SteeringTerm::HardLeft);
        assert_eq!(steer(inputs(Near, Far, Far)), SteeringTerm::HardRight);
        assert_eq!(steer(inputs(Medium, Far, Near)), SteeringTerm::Left);
        assert_eq!(steer(inputs(Medium, Near, Near)), SteeringTerm::HardLeft);
        assert_eq!(steer(inputs(Near, Near, Medium)), SteeringTerm::HardRight);
        assert_eq!(steer(inputs(Medium, Near, Medium)), SteeringTerm::Left);
    }

    #[test]
    fn test_steering_is_mirror_symmetric_off_center() {
        for i in 0..RULE_COUNT {
            let rule = RuleInputs::from_index(i);
            if rule.left == rule.right {
                continue;
            }
            let mirrored = inputs(rule.right, rule.front, rule.left);
            assert_eq!(
                STEERING_CONSEQUENTS[i] + STEERING_CONSEQUENTS[mirrored.index()],
                4,
                "{rule:?}"
            );
        }
    }

    #[test]
    fn test_velocity() {
        use SensorTerm::{Far, Medium, Near};
        let speed = |i: RuleInputs| VelocityTerm::ALL[VELOCITY_CONSEQUENTS[i.index()]];
        assert_eq!(speed(inputs(Far, Near, Far)), VelocityTerm::Slow);
        assert_eq!(speed(inputs(Near, Medium, Far)), VelocityTerm::Slow);
        assert_eq!(speed(inputs(Medium, Medium, Far)), VelocityTerm::Cruise);
        assert_eq!(speed(inputs(Near, Far, Far)), VelocityTerm::Cruise);
        assert_eq!(speed(inputs(Medium, Far, Far)), VelocityTerm::Fast);
    }
}
