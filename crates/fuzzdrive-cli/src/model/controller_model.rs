use std::path::Path;

use chrono::{DateTime, Utc};
use fuzzdrive_controller::{FuzzyController, SimulationParams};
use fuzzdrive_engine::TrackKind;
use fuzzdrive_training::{GaConfig, Strategy};
use serde::{Deserialize, Serialize};

use crate::util;

/// A trained controller together with what is needed to replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub track: TrackKind,
    pub strategy: Strategy,
    pub seed: u64,
    pub ga_config: GaConfig,
    /// Older model files carry no parameters; they were trained with the defaults.
    #[serde(default)]
    pub params: SimulationParams,
    pub final_fitness: f32,
    pub controller: FuzzyController,
}

impl ControllerModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let model: Self = util::read_json_file("controller model", path.as_ref())?;
        anyhow::ensure!(
            model.controller.is_finite(),
            "controller model {} contains non-finite parameters",
            path.as_ref().display()
        );
        Ok(model)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use fuzzdrive_controller::ControllerLimits;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::util::Destination;

    pub(crate) fn sample_model() -> ControllerModel {
        let params = SimulationParams::default();
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        ControllerModel {
            name: "balanced-sine".to_owned(),
            trained_at: Utc::now(),
            track: TrackKind::Sine,
            strategy: Strategy::Balanced,
            seed: 11,
            ga_config: Strategy::Balanced.config(),
            params,
            final_fitness: 42.0,
            controller: FuzzyController::random(&mut rng, &ControllerLimits::default()),
        }
    }

    #[test]
    fn test_saved_model_can_be_opened() {
        let path = std::env::temp_dir().join(format!("fuzzdrive-model-{}.json", std::process::id()));
        let model = sample_model();
        Destination::new(Some(path.clone())).write_json(&model).unwrap();
        let opened = ControllerModel::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(opened.name, model.name);
        assert_eq!(opened.track, model.track);
        assert_eq!(opened.controller, model.controller);
        assert_eq!(opened.params, model.params);
    }

    #[test]
    fn test_missing_params_fall_back_to_defaults() {
        let mut value = serde_json::to_value(sample_model()).unwrap();
        value.as_object_mut().unwrap().remove("params");
        let model: ControllerModel = serde_json::from_value(value).unwrap();
        assert_eq!(model.params, SimulationParams::default());
    }
}
