use std::path::PathBuf;

use anyhow::Context as _;
use fuzzdrive_controller::{Decoder, SimulationOutcome, TickRecord, TrackEvaluator};
use fuzzdrive_engine::{Track, TrackKind};
use serde::Serialize;

use crate::{model::controller_model::ControllerModel, util::Destination};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Trained controller model file
    #[arg(long)]
    model: PathBuf,
    /// Track to drive on; defaults to the track the model was trained on
    #[arg(long)]
    track: Option<TrackKind>,
    /// Write the per-tick trace as JSON to this file
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Print the inference details of the first N ticks
    #[arg(long, default_value_t = 0)]
    explain: usize,
}

#[derive(Debug, Serialize)]
struct SimulationTrace<'a> {
    model: &'a str,
    track: TrackKind,
    outcome: SimulationOutcome,
    ticks: &'a [TickRecord],
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let model = ControllerModel::open(&arg.model)?;
    let track = arg.track.unwrap_or(model.track);
    if track != model.track {
        log::warn!(
            "model {} was trained on the {} track, driving it on {}",
            model.name,
            model.track,
            track
        );
    }

    let evaluator = TrackEvaluator::new(Track::builtin(track), model.params).with_context(|| {
        format!(
            "Invalid simulation parameters in model {}",
            arg.model.display()
        )
    })?;
    let mut ticks = Vec::<TickRecord>::new();
    let outcome = evaluator.evaluate_with_observer(&model.controller, &mut ticks);

    if arg.explain > 0 {
        let decoder = Decoder::new(&model.controller, model.params.limits());
        for record in ticks.iter().take(arg.explain) {
            eprintln!("Tick #{}:", record.tick);
            eprintln!("{}", decoder.explain(record.vehicle.readings));
        }
        eprintln!();
    }

    eprintln!("Simulation of {} on the {track} track", model.name);
    eprintln!("  State: {}", outcome.state);
    eprintln!("  Ticks: {}", outcome.ticks);
    eprintln!("  Distance: {:.2}", outcome.distance);
    eprintln!("  Remaining distance: {:.2}", outcome.remaining_distance);
    eprintln!("  Penalty: {:.2}", outcome.penalty);
    eprintln!("  Mean imbalance: {:.3}", outcome.mean_imbalance);
    eprintln!("  Fitness: {:.3}", outcome.fitness);
    eprintln!("  Efficiency: {:.3}", outcome.efficiency());

    if let Some(path) = &arg.trace {
        let destination = Destination::new(Some(path.clone()));
        destination.write_json(&SimulationTrace {
            model: &model.name,
            track,
            outcome,
            ticks: &ticks,
        })?;
        eprintln!("Trace of {} ticks saved to {destination}", ticks.len());
    }
    Ok(())
}
