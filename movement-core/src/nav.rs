//! Navigation-graph query contract, plus `GridNav`, the box-area
//! implementation the reference world and the tests run against. Only the
//! query surface matters to the planner; how a real game fills the graph is
//! its own business.

use crate::math::Vec3;
use crate::trace::BoxBounds;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelType {
    Walk,
    WalkOffLedge,
    Jump,
    StrafeJump,
    BarrierJump,
    Swim,
    JumpPad,
    Teleport,
    Elevator,
    Ladder,
}

impl TravelType {
    pub const fn flag(self) -> u32 {
        match self {
            Self::Walk => 1 << 0,
            Self::WalkOffLedge => 1 << 1,
            Self::Jump => 1 << 2,
            Self::StrafeJump => 1 << 3,
            Self::BarrierJump => 1 << 4,
            Self::Swim => 1 << 5,
            Self::JumpPad => 1 << 6,
            Self::Teleport => 1 << 7,
            Self::Elevator => 1 << 8,
            Self::Ladder => 1 << 9,
        }
    }
}

/// Everything a ground-capable agent can use.
pub const TRAVEL_FLAGS_DEFAULT: u32 = TravelType::Walk.flag()
    | TravelType::WalkOffLedge.flag()
    | TravelType::Jump.flag()
    | TravelType::StrafeJump.flag()
    | TravelType::BarrierJump.flag()
    | TravelType::Swim.flag()
    | TravelType::JumpPad.flag()
    | TravelType::Teleport.flag()
    | TravelType::Elevator.flag();

/// One edge of the navigation graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reach {
    pub from_area: u32,
    pub to_area: u32,
    pub start: Vec3,
    pub end: Vec3,
    pub travel_type: TravelType,
}

pub trait NavQuery {
    /// Area containing `point`; 0 when outside the graph.
    fn area_num(&self, point: Vec3) -> u32;

    fn area_bounds(&self, area: u32) -> Option<BoxBounds>;

    fn area_is_grounded(&self, area: u32) -> bool;

    fn area_is_disabled(&self, area: u32) -> bool;

    /// Pathfinder cost in centiseconds between two areas under a travel-flag
    /// mask; `None` when unreachable.
    fn travel_time(&self, from: u32, to: u32, travel_flags: u32) -> Option<u32>;

    /// First reachability edge of the best path from `from` to `to`.
    fn next_reach(&self, from: u32, to: u32, travel_flags: u32) -> Option<Reach>;

    /// Append up to `limit` successive reach edges toward `to`.
    fn reach_chain(&self, from: u32, to: u32, travel_flags: u32, limit: usize, out: &mut Vec<Reach>);

    /// Append areas whose bounds intersect a sphere around `center`.
    fn areas_in_radius(&self, center: Vec3, radius: f32, out: &mut Vec<u32>);
}

#[derive(Clone, Debug)]
pub struct NavLink {
    pub to: u32,
    pub travel_type: TravelType,
    pub start: Vec3,
    pub end: Vec3,
    pub time_cs: u32,
}

#[derive(Clone, Debug)]
pub struct NavArea {
    pub bounds: BoxBounds,
    pub grounded: bool,
    pub disabled: bool,
    pub links: Vec<NavLink>,
}

impl NavArea {
    fn floor_center(&self) -> Vec3 {
        let center = self.bounds.center();
        Vec3::new(center.x, center.y, self.bounds.mins.z)
    }
}

/// Area numbers are 1-based; 0 is reserved for "no area".
#[derive(Clone, Debug, Default)]
pub struct GridNav {
    areas: Vec<NavArea>,
}

impl GridNav {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_area(&mut self, bounds: BoxBounds, grounded: bool) -> u32 {
        self.areas.push(NavArea {
            bounds,
            grounded,
            disabled: false,
            links: Vec::new(),
        });
        self.areas.len() as u32
    }

    pub fn set_disabled(&mut self, area: u32, disabled: bool) {
        if let Some(entry) = self.area_mut(area) {
            entry.disabled = disabled;
        }
    }

    /// Link `from` to `to` with endpoints at the two floor centers.
    pub fn link(&mut self, from: u32, to: u32, travel_type: TravelType, time_cs: u32) {
        let (Some(from_entry), Some(to_entry)) = (self.area(from), self.area(to)) else {
            return;
        };
        let start = from_entry.floor_center();
        let end = to_entry.floor_center();
        self.link_with_points(from, to, travel_type, time_cs, start, end);
    }

    pub fn link_with_points(
        &mut self,
        from: u32,
        to: u32,
        travel_type: TravelType,
        time_cs: u32,
        start: Vec3,
        end: Vec3,
    ) {
        if let Some(entry) = self.area_mut(from) {
            entry.links.push(NavLink {
                to,
                travel_type,
                start,
                end,
                time_cs: time_cs.max(1),
            });
        }
    }

    /// Link both directions with the same travel type and cost.
    pub fn link_bidir(&mut self, a: u32, b: u32, travel_type: TravelType, time_cs: u32) {
        self.link(a, b, travel_type, time_cs);
        self.link(b, a, travel_type, time_cs);
    }

    fn area(&self, area: u32) -> Option<&NavArea> {
        if area == 0 {
            return None;
        }
        self.areas.get(area as usize - 1)
    }

    fn area_mut(&mut self, area: u32) -> Option<&mut NavArea> {
        if area == 0 {
            return None;
        }
        self.areas.get_mut(area as usize - 1)
    }

    /// Dijkstra over the link graph. Returns per-area best cost and the first
    /// link index to take from `from`, for both `travel_time` and
    /// `next_reach`.
    fn best_path(&self, from: u32, to: u32, travel_flags: u32) -> Option<(u32, Option<usize>)> {
        let (Some(_), Some(_)) = (self.area(from), self.area(to)) else {
            return None;
        };
        if self.area_is_disabled(to) {
            return None;
        }
        if from == to {
            return Some((1, None));
        }

        let count = self.areas.len();
        let mut cost = vec![u32::MAX; count + 1];
        let mut first_link: Vec<Option<usize>> = vec![None; count + 1];
        let mut heap = BinaryHeap::new();
        cost[from as usize] = 0;
        heap.push(Reverse((0u32, from)));

        while let Some(Reverse((c, area))) = heap.pop() {
            if c > cost[area as usize] {
                continue;
            }
            if area == to {
                return Some((c.max(1), first_link[area as usize]));
            }
            let entry = self.area(area)?;
            for (index, link) in entry.links.iter().enumerate() {
                if link.travel_type.flag() & travel_flags == 0 {
                    continue;
                }
                if self.area_is_disabled(link.to) {
                    continue;
                }
                let next_cost = c.saturating_add(link.time_cs);
                if next_cost < cost[link.to as usize] {
                    cost[link.to as usize] = next_cost;
                    first_link[link.to as usize] = if area == from {
                        Some(index)
                    } else {
                        first_link[area as usize]
                    };
                    heap.push(Reverse((next_cost, link.to)));
                }
            }
        }
        None
    }

    fn link_as_reach(&self, from: u32, index: usize) -> Option<Reach> {
        let entry = self.area(from)?;
        let link = entry.links.get(index)?;
        Some(Reach {
            from_area: from,
            to_area: link.to,
            start: link.start,
            end: link.end,
            travel_type: link.travel_type,
        })
    }
}

impl NavQuery for GridNav {
    fn area_num(&self, point: Vec3) -> u32 {
        for (index, area) in self.areas.iter().enumerate() {
            if area.bounds.contains_point(point) {
                return index as u32 + 1;
            }
        }
        0
    }

    fn area_bounds(&self, area: u32) -> Option<BoxBounds> {
        self.area(area).map(|entry| entry.bounds)
    }

    fn area_is_grounded(&self, area: u32) -> bool {
        self.area(area).map(|entry| entry.grounded).unwrap_or(false)
    }

    fn area_is_disabled(&self, area: u32) -> bool {
        self.area(area).map(|entry| entry.disabled).unwrap_or(true)
    }

    fn travel_time(&self, from: u32, to: u32, travel_flags: u32) -> Option<u32> {
        self.best_path(from, to, travel_flags).map(|(cost, _)| cost)
    }

    fn next_reach(&self, from: u32, to: u32, travel_flags: u32) -> Option<Reach> {
        let (_, first_link) = self.best_path(from, to, travel_flags)?;
        self.link_as_reach(from, first_link?)
    }

    fn reach_chain(
        &self,
        from: u32,
        to: u32,
        travel_flags: u32,
        limit: usize,
        out: &mut Vec<Reach>,
    ) {
        let mut current = from;
        for _ in 0..limit {
            let Some(reach) = self.next_reach(current, to, travel_flags) else {
                break;
            };
            current = reach.to_area;
            out.push(reach);
            if current == to {
                break;
            }
        }
    }

    fn areas_in_radius(&self, center: Vec3, radius: f32, out: &mut Vec<u32>) {
        let probe = BoxBounds::new(
            center - Vec3::new(radius, radius, radius),
            center + Vec3::new(radius, radius, radius),
        );
        for (index, area) in self.areas.iter().enumerate() {
            if area.bounds.overlaps(&probe) {
                out.push(index as u32 + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_box(x0: f32, x1: f32, z: f32) -> BoxBounds {
        BoxBounds::new(Vec3::new(x0, -64.0, z), Vec3::new(x1, 64.0, z + 128.0))
    }

    fn three_room_graph() -> GridNav {
        let mut nav = GridNav::new();
        let a = nav.add_area(floor_box(0.0, 128.0, 0.0), true);
        let b = nav.add_area(floor_box(128.0, 256.0, 0.0), true);
        let c = nav.add_area(floor_box(256.0, 384.0, 0.0), true);
        nav.link_bidir(a, b, TravelType::Walk, 10);
        nav.link_bidir(b, c, TravelType::Jump, 25);
        nav
    }

    #[test]
    fn travel_time_respects_the_flag_mask() {
        let nav = three_room_graph();
        assert_eq!(nav.travel_time(1, 3, TRAVEL_FLAGS_DEFAULT), Some(35));
        assert_eq!(nav.travel_time(1, 3, TravelType::Walk.flag()), None);
        assert_eq!(nav.travel_time(2, 2, TRAVEL_FLAGS_DEFAULT), Some(1));
    }

    #[test]
    fn reach_chain_walks_the_best_path() {
        let nav = three_room_graph();
        let mut chain = Vec::new();
        nav.reach_chain(1, 3, TRAVEL_FLAGS_DEFAULT, 8, &mut chain);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].to_area, 2);
        assert_eq!(chain[1].to_area, 3);
        assert_eq!(chain[1].travel_type, TravelType::Jump);
    }

    #[test]
    fn disabled_areas_block_routing() {
        let mut nav = three_room_graph();
        nav.set_disabled(2, true);
        assert_eq!(nav.travel_time(1, 3, TRAVEL_FLAGS_DEFAULT), None);
        assert!(nav.area_is_disabled(2));
    }
}
