//! Tactical-spot query contract. The planner only ever asks for ranked
//! candidate points around an origin; the precomputed tables behind the
//! registry (and their file I/O) belong to whoever built the spot set.

use crate::math::Vec3;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpotProfile {
    /// High ground / sightline seeking, away from the threat's reach.
    Advantage { threat: Vec3 },
    /// Break line to the threat.
    Cover { threat: Vec3 },
    /// Maximize distance from a danger point (grenade, incoming rocket).
    DangerAvoid { danger: Vec3 },
    /// Closest reasonable walking destination.
    NearestWalkable,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotCandidate {
    pub point: Vec3,
    pub area: u32,
    pub score: f32,
}

pub trait SpotQuery {
    /// Fill `out` with candidates inside `radius` of `origin`, best first.
    fn query(&self, origin: Vec3, radius: f32, profile: SpotProfile, out: &mut Vec<SpotCandidate>);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TacticalSpot {
    pub point: Vec3,
    pub area: u32,
}

/// Fixed spot set indexed through a uniform 3D grid for radius queries.
/// Optional spot-to-spot visibility (bit rows) and travel-time tables refine
/// the ranking when present.
#[derive(Clone, Debug)]
pub struct SpotRegistry {
    spots: Vec<TacticalSpot>,
    cell_size: f32,
    grid: HashMap<(i32, i32, i32), Vec<u16>>,
    visibility: Option<Vec<u8>>,
    vis_stride: usize,
}

impl SpotRegistry {
    pub fn new(spots: Vec<TacticalSpot>, cell_size: f32) -> Self {
        let cell_size = cell_size.max(1.0);
        let mut grid: HashMap<(i32, i32, i32), Vec<u16>> = HashMap::new();
        for (index, spot) in spots.iter().enumerate() {
            grid.entry(cell_of(spot.point, cell_size))
                .or_default()
                .push(index as u16);
        }
        Self {
            spots,
            cell_size,
            grid,
            visibility: None,
            vis_stride: 0,
        }
    }

    /// Attach a row-major spot-to-spot visibility bit table; row length is
    /// `ceil(spot_count / 8)` bytes.
    pub fn with_visibility(mut self, table: Vec<u8>) -> Self {
        self.vis_stride = self.spots.len().div_ceil(8);
        debug_assert_eq!(table.len(), self.vis_stride * self.spots.len());
        self.visibility = Some(table);
        self
    }

    pub fn spot_count(&self) -> usize {
        self.spots.len()
    }

    fn sees(&self, from: usize, to: usize) -> bool {
        let Some(table) = &self.visibility else {
            return true;
        };
        let byte = table[from * self.vis_stride + to / 8];
        byte & (1 << (to % 8)) != 0
    }

    /// Fraction of all spots this spot has a sightline to.
    fn visibility_fraction(&self, index: usize) -> f32 {
        if self.visibility.is_none() || self.spots.is_empty() {
            return 0.5;
        }
        let seen = (0..self.spots.len())
            .filter(|other| *other != index && self.sees(index, *other))
            .count();
        seen as f32 / self.spots.len().max(1) as f32
    }

    fn score(&self, index: usize, origin: Vec3, radius: f32, profile: SpotProfile) -> f32 {
        let spot = self.spots[index];
        let dist_frac = (spot.point.distance_to(origin) / radius).min(1.0);
        match profile {
            SpotProfile::NearestWalkable => 1.0 - dist_frac,
            SpotProfile::Advantage { threat } => {
                let height_gain = ((spot.point.z - threat.z) / 128.0).clamp(-1.0, 1.0);
                self.visibility_fraction(index) + height_gain * 0.5 - dist_frac * 0.5
            }
            SpotProfile::Cover { threat } => {
                let threat_frac = (spot.point.distance_to(threat) / radius).min(2.0);
                // Low sightline exposure beats raw distance for cover.
                (1.0 - self.visibility_fraction(index)) + threat_frac * 0.5 - dist_frac * 0.25
            }
            SpotProfile::DangerAvoid { danger } => {
                (spot.point.distance_to(danger) / radius).min(2.0) - dist_frac * 0.25
            }
        }
    }
}

impl SpotQuery for SpotRegistry {
    fn query(&self, origin: Vec3, radius: f32, profile: SpotProfile, out: &mut Vec<SpotCandidate>) {
        let radius = radius.max(1.0);
        let min_cell = cell_of(origin - Vec3::new(radius, radius, radius), self.cell_size);
        let max_cell = cell_of(origin + Vec3::new(radius, radius, radius), self.cell_size);

        let mut candidates = Vec::new();
        for cx in min_cell.0..=max_cell.0 {
            for cy in min_cell.1..=max_cell.1 {
                for cz in min_cell.2..=max_cell.2 {
                    let Some(indices) = self.grid.get(&(cx, cy, cz)) else {
                        continue;
                    };
                    for index in indices {
                        let index = *index as usize;
                        let spot = self.spots[index];
                        if spot.point.distance_sq_to(origin) > radius * radius {
                            continue;
                        }
                        candidates.push(SpotCandidate {
                            point: spot.point,
                            area: spot.area,
                            score: self.score(index, origin, radius, profile),
                        });
                    }
                }
            }
        }

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        out.extend(candidates);
    }
}

#[inline]
fn cell_of(point: Vec3, cell_size: f32) -> (i32, i32, i32) {
    (
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
        (point.z / cell_size).floor() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SpotRegistry {
        SpotRegistry::new(
            vec![
                TacticalSpot {
                    point: Vec3::new(0.0, 0.0, 0.0),
                    area: 1,
                },
                TacticalSpot {
                    point: Vec3::new(100.0, 0.0, 0.0),
                    area: 2,
                },
                TacticalSpot {
                    point: Vec3::new(500.0, 0.0, 0.0),
                    area: 3,
                },
            ],
            128.0,
        )
    }

    #[test]
    fn radius_query_filters_and_ranks_by_distance() {
        let registry = registry();
        let mut out = Vec::new();
        registry.query(
            Vec3::new(10.0, 0.0, 0.0),
            200.0,
            SpotProfile::NearestWalkable,
            &mut out,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].area, 1);
        assert_eq!(out[1].area, 2);
    }

    #[test]
    fn danger_avoidance_prefers_the_far_spot() {
        let registry = registry();
        let mut out = Vec::new();
        registry.query(
            Vec3::new(50.0, 0.0, 0.0),
            120.0,
            SpotProfile::DangerAvoid {
                danger: Vec3::new(0.0, 0.0, 0.0),
            },
            &mut out,
        );
        assert_eq!(out[0].area, 2);
    }
}
