//! Fuzzy inference: sensor readings in, motion deltas out.
//!
//! Decoding runs the classic three stages once per output:
//!
//! 1. **Fuzzify** - clamp each reading to `[0, max_range]` and compute its
//!    [`Memberships`] from the output's own vertex rows
//! 2. **Evaluate rules** - the firing strength of a rule is the minimum of its three input
//!    degrees, scaled by the rule weight; strengths are aggregated per output term by maximum
//! 3. **Defuzzify** - weighted centroid of the term centres, using the aggregated strengths
//!    as weights, clamped to the output domain
//!
//! Steering and velocity are decoded independently, each from its own rule matrix.

use std::{array, fmt::Write as _};

use fuzzdrive_engine::SensorReadings;
use serde::{Deserialize, Serialize};

use crate::{
    membership::{Memberships, SensorTerm, fuzzify},
    rule_base::{
        RULE_COUNT, RuleInputs, STEERING_CONSEQUENTS, SteeringTerm, VELOCITY_CONSEQUENTS,
        VelocityTerm,
    },
    rules::{ControllerLimits, Domain, FuzzyController, RuleMatrix, SENSOR_COUNT},
};

/// Below this total activation no rule is considered to fire.
const MIN_ACTIVATION: f32 = 1e-6;

/// Control output of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionDelta {
    /// Forward speed, in world units per second.
    pub speed: f32,
    /// Heading change for this tick, in radians (positive turns left).
    pub rotation: f32,
}

/// Intermediate result of inference for one output.
#[derive(Debug, Clone, Copy)]
struct Inference<const TERMS: usize> {
    memberships: [Memberships; SENSOR_COUNT],
    activation: [f32; TERMS],
}

/// Evaluates a [`FuzzyController`] on sensor readings.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    controller: &'a FuzzyController,
    limits: ControllerLimits,
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub fn new(controller: &'a FuzzyController, limits: ControllerLimits) -> Self {
        Self { controller, limits }
    }

    #[must_use]
    pub fn controller(&self) -> &'a FuzzyController {
        self.controller
    }

    /// Computes the speed and rotation for the given readings.
    #[must_use]
    pub fn decode(&self, readings: SensorReadings) -> MotionDelta {
        let inputs = readings.clamped(self.limits.max_range).to_array();
        let steering = infer(&self.controller.steering, inputs, &STEERING_CONSEQUENTS);
        let velocity = infer(&self.controller.velocity, inputs, &VELOCITY_CONSEQUENTS);
        MotionDelta {
            speed: defuzzify(
                &velocity.activation,
                self.controller.velocity.centers(),
                FuzzyController::velocity_centers(&self.limits),
            ),
            rotation: defuzzify(
                &steering.activation,
                self.controller.steering.centers(),
                FuzzyController::steering_centers(&self.limits),
            ),
        }
    }

    /// Human-readable account of one decoding step.
    ///
    /// Lists the dominant term and degrees of each input, the aggregated activation of
    /// every output term and the final outputs. Meant for diagnostics only.
    #[must_use]
    pub fn explain(&self, readings: SensorReadings) -> String {
        let inputs = readings.clamped(self.limits.max_range).to_array();
        let steering = infer(&self.controller.steering, inputs, &STEERING_CONSEQUENTS);
        let velocity = infer(&self.controller.velocity, inputs, &VELOCITY_CONSEQUENTS);
        let delta = self.decode(readings);

        let mut text = String::new();
        for ((name, value), m) in ["left", "front", "right"]
            .iter()
            .zip(inputs)
            .zip(&steering.memberships)
        {
            let _ = writeln!(
                text,
                "{name:>5}: {value:6.2} -> {} (near {:.2}, medium {:.2}, far {:.2})",
                m.dominant(),
                m.degree(SensorTerm::Near),
                m.degree(SensorTerm::Medium),
                m.degree(SensorTerm::Far),
            );
        }
        let _ = write!(text, "steer:");
        for (term, a) in SteeringTerm::ALL.iter().zip(steering.activation) {
            let _ = write!(text, " {term} {a:.2}");
        }
        let _ = writeln!(text, " => {:+.3} rad", delta.rotation);
        let _ = write!(text, "speed:");
        for (term, a) in VelocityTerm::ALL.iter().zip(velocity.activation) {
            let _ = write!(text, " {term} {a:.2}");
        }
        let _ = write!(text, " => {:.3}", delta.speed);
        text
    }
}

fn infer<const TERMS: usize>(
    matrix: &RuleMatrix<TERMS>,
    inputs: [f32; SENSOR_COUNT],
    consequents: &[usize; RULE_COUNT],
) -> Inference<TERMS> {
    let memberships: [Memberships; SENSOR_COUNT] =
        array::from_fn(|i| fuzzify(inputs[i], matrix.vertices()[i]));
    let mut activation = [0.0_f32; TERMS];
    for (rule, (&term, &weight)) in consequents.iter().zip(matrix.weights()).enumerate() {
        let RuleInputs { left, front, right } = RuleInputs::from_index(rule);
        let strength = memberships[0]
            .degree(left)
            .min(memberships[1].degree(front))
            .min(memberships[2].degree(right))
            * weight.clamp(0.0, 1.0);
        activation[term] = activation[term].max(strength);
    }
    Inference {
        memberships,
        activation,
    }
}

fn defuzzify(activation: &[f32], centers: &[f32], domain: Domain) -> f32 {
    let total = activation.iter().sum::<f32>();
    if !(total >= MIN_ACTIVATION) {
        return domain.clamp(0.0);
    }
    let weighted = activation
        .iter()
        .zip(centers)
        .map(|(a, c)| a * domain.clamp(*c))
        .sum::<f32>();
    domain.clamp(weighted / total)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::rules::{SteeringRules, VelocityRules};

    const VERTICES: [[f32; 4]; 3] = [[2.0, 5.0, 8.0, 12.0]; 3];

    fn hand_tuned() -> FuzzyController {
        FuzzyController {
            steering: SteeringRules::new(VERTICES, [-0.1, -0.05, 0.0, 0.05, 0.1], [1.0; 27]),
            velocity: VelocityRules::new(VERTICES, [1.0, 5.0, 9.0], [1.0; 27]),
        }
    }

    #[test]
    fn test_open_road_drives_straight_and_fast() {
        let controller = hand_tuned();
        let decoder = Decoder::new(&controller, ControllerLimits::default());
        let delta = decoder.decode(SensorReadings::new(20.0, 20.0, 20.0));
        assert!(delta.rotation.abs() < 1e-6);
        assert!((delta.speed - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_wall_on_right_turns_left() {
        let controller = hand_tuned();
        let decoder = Decoder::new(&controller, ControllerLimits::default());
        let delta = decoder.decode(SensorReadings::new(20.0, 20.0, 1.0));
        assert!(delta.rotation > 0.05);
        let mirrored = decoder.decode(SensorReadings::new(1.0, 20.0, 20.0));
        assert!((delta.rotation + mirrored.rotation).abs() < 1e-6);
    }

    #[test]
    fn test_blocked_front_slows_down() {
        let controller = hand_tuned();
        let decoder = Decoder::new(&controller, ControllerLimits::default());
        let delta = decoder.decode(SensorReadings::new(20.0, 0.5, 20.0));
        assert!((delta.speed - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_weights_produce_neutral_output() {
        let mut controller = hand_tuned();
        controller.velocity = VelocityRules::new(VERTICES, [1.0, 5.0, 9.0], [0.0; 27]);
        let decoder = Decoder::new(&controller, ControllerLimits::default());
        let delta = decoder.decode(SensorReadings::new(20.0, 20.0, 20.0));
        assert!(delta.speed.abs() < f32::EPSILON);
    }

    #[test]
    fn test_outputs_stay_within_limits() {
        let limits = ControllerLimits::default();
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        for _ in 0..50 {
            let controller = FuzzyController::random(&mut rng, &limits);
            let decoder = Decoder::new(&controller, limits);
            for readings in [
                SensorReadings::new(0.0, 0.0, 0.0),
                SensorReadings::new(3.0, 10.0, 17.0),
                SensorReadings::new(f32::INFINITY, -4.0, f32::NAN),
            ] {
                let delta = decoder.decode(readings);
                assert!(delta.speed >= 0.0 && delta.speed <= limits.max_speed);
                assert!(delta.rotation.abs() <= limits.max_rotation);
            }
        }
    }

    #[test]
    fn test_explain_mentions_every_input() {
        let controller = hand_tuned();
        let decoder = Decoder::new(&controller, ControllerLimits::default());
        let text = decoder.explain(SensorReadings::new(20.0, 6.0, 1.0));
        assert!(text.contains("left"));
        assert!(text.contains("front"));
        assert!(text.contains("right"));
        assert!(text.contains("Medium"));
        assert!(text.contains("HardLeft"));
    }
}
