//! Drive one planner-controlled agent through a scenario, frame by frame,
//! and report what happened.

use crate::config::PlannerConfig;
use crate::context::{PlanRequest, PredictionContext};
use crate::scenario::{self, Scenario};
use anyhow::{anyhow, Result};
use arena_movement_core::command::PACKED_INPUT_LEN;
use arena_movement_core::env::{FrameEvents, SimEnvironment};
use arena_movement_core::math::Vec3;
use arena_movement_core::nav::NavQuery;
use serde::Serialize;

/// Cadence at which the real game asks for input.
pub const REAL_FRAME_MS: u32 = 16;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub scenario: String,
    pub seed: u32,
    pub max_frames: u32,
    pub frames: u32,
    pub reached_at_frame: Option<u32>,
    pub sessions: u32,
    pub rollbacks: u32,
    pub reuse_hits: u32,
    pub overflows: u32,
    pub distance_covered: f32,
    pub final_origin: Vec3,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    /// Packed command submitted each frame, in order.
    pub commands: Vec<[u8; PACKED_INPUT_LEN]>,
}

pub fn run_scenario(
    name: &str,
    config: PlannerConfig,
    seed: u32,
    max_frames: u32,
) -> Result<RunArtifact> {
    let scenario = scenario::by_name(name).ok_or_else(|| anyhow!("unknown scenario '{name}'"))?;
    run_instance(scenario, config, seed, max_frames)
}

pub fn run_instance(
    scenario: Scenario,
    config: PlannerConfig,
    seed: u32,
    max_frames: u32,
) -> Result<RunArtifact> {
    if max_frames == 0 {
        return Err(anyhow!("max_frames must be > 0"));
    }

    let mut planner = PredictionContext::new(config, seed);
    let mut state = scenario.start;
    let mut substates = scenario.substates;
    let mut last_events = FrameEvents::default();
    let mut now_ms: u64 = 0;
    let mut distance = 0.0f32;
    let mut reached_at_frame = None;
    let mut commands = Vec::with_capacity(max_frames as usize);
    let mut frames = 0u32;

    for frame in 0..max_frames {
        frames = frame + 1;
        state.physics.area_num = scenario.nav.area_num(state.physics.origin);

        let command = {
            let mut request = PlanRequest {
                state: &state,
                substates: &mut substates,
                last_events,
                now_ms,
                target: scenario.target,
                has_tracked_enemy: false,
            };
            planner.frame_input(&mut request, &scenario.world, &scenario.nav, &scenario.spots)
        };
        commands.push(command.encode_packed());

        let previous_origin = state.physics.origin;
        let mut events = FrameEvents::default();
        scenario
            .world
            .step_player(&mut state, &command, REAL_FRAME_MS, &mut events);
        substates.frame(REAL_FRAME_MS);
        substates.try_deactivate(&state.physics);
        last_events = events;

        distance += previous_origin.distance_to(state.physics.origin);
        now_ms += REAL_FRAME_MS as u64;

        let area = scenario.nav.area_num(state.physics.origin);
        if area == scenario.target.area && state.physics.grounded() {
            reached_at_frame = Some(frame);
            break;
        }
    }

    let stats = planner.stats();
    Ok(RunArtifact {
        metrics: RunMetrics {
            scenario: scenario.name.to_string(),
            seed,
            max_frames,
            frames,
            reached_at_frame,
            sessions: stats.sessions,
            rollbacks: stats.rollbacks,
            reuse_hits: stats.reuse_hits,
            overflows: stats.overflows,
            distance_covered: distance,
            final_origin: state.physics.origin,
        },
        commands,
    })
}
