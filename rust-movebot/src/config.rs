//! Planner tuning. Every constant here was arrived at empirically in play,
//! so the whole set is data: load a profile from JSON or take the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// 0.0 (clumsy) to 1.0 (sharp); scales dodge attempt budgets.
    pub skill: f32,

    // Air-steering assist for the hop family: extra acceleration toward the
    // intended direction, strongest at low speed, gone at the ceiling.
    pub assist_accel_max: f32,
    pub assist_full_speed: f32,
    pub assist_ceiling_speed: f32,
    /// Velocity/intent dot product above which movement counts as straight.
    pub straight_alignment_dot: f32,

    // Speed-loss detection. Each pattern accumulates its own duration and
    // only triggers a rollback once it exceeds its tolerance.
    pub wall_bump_prev_speed: f32,
    pub wall_bump_now_speed: f32,
    pub wall_bump_tolerance_ms: u32,
    pub bounce_back_dot: f32,
    pub bounce_tolerance_ms: u32,
    pub tolerable_decel_ups: f32,
    pub decel_tolerance_ms: u32,

    pub dodge_attempts_base: u32,
    pub dodge_attempts_per_skill: u32,

    // Cached-plan reuse tolerances.
    pub reuse_origin_tolerance: f32,
    pub reuse_speed_tolerance_frac: f32,
    pub reuse_dir_tolerance_deg: f32,

    pub camp_strafe_min_ms: u32,
    pub camp_strafe_max_ms: u32,

    pub max_rollbacks_per_session: u32,
    pub max_step_iterations: u32,

    /// Grounded dwell in the target area before a plan counts as done.
    pub target_dwell_ms: u32,
    /// Distance kept moving after a landing before a plan counts as done.
    pub landing_confirmation_units: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            skill: 0.5,
            assist_accel_max: 500.0,
            assist_full_speed: 450.0,
            assist_ceiling_speed: 900.0,
            straight_alignment_dot: 0.996,
            wall_bump_prev_speed: 100.0,
            wall_bump_now_speed: 10.0,
            wall_bump_tolerance_ms: 32,
            bounce_back_dot: -0.3,
            bounce_tolerance_ms: 64,
            tolerable_decel_ups: 250.0,
            decel_tolerance_ms: 384,
            dodge_attempts_base: 2,
            dodge_attempts_per_skill: 4,
            reuse_origin_tolerance: 3.0,
            reuse_speed_tolerance_frac: 0.005,
            reuse_dir_tolerance_deg: 5.0,
            camp_strafe_min_ms: 400,
            camp_strafe_max_ms: 900,
            max_rollbacks_per_session: 24,
            max_step_iterations: 96,
            target_dwell_ms: 144,
            landing_confirmation_units: 96.0,
        }
    }
}

impl PlannerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("failed parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn dodge_attempt_budget(&self) -> u32 {
        self.dodge_attempts_base
            + (self.skill.clamp(0.0, 1.0) * self.dodge_attempts_per_skill as f32) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_profiles_fall_back_to_defaults() {
        let config: PlannerConfig = serde_json::from_str(r#"{"skill": 1.0}"#).unwrap();
        assert_eq!(config.skill, 1.0);
        assert_eq!(config.wall_bump_tolerance_ms, 32);
        assert_eq!(config.dodge_attempt_budget(), 6);
    }
}
