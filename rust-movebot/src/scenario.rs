//! Built-in test worlds: small brush maps with a matching nav graph and spot
//! set, used by the runner, the benchmark, and the integration tests.

use crate::context::NavTarget;
use arena_movement_core::math::Vec3;
use arena_movement_core::nav::{GridNav, NavQuery, TravelType};
use arena_movement_core::sim::MoveWorld;
use arena_movement_core::snapshot::{PhysicsSnapshot, PlayerState};
use arena_movement_core::substate::SubStateBundle;
use arena_movement_core::tactical::{SpotRegistry, TacticalSpot};
use arena_movement_core::trace::BoxBounds;

pub struct Scenario {
    pub name: &'static str,
    pub world: MoveWorld,
    pub nav: GridNav,
    pub spots: SpotRegistry,
    pub start: PlayerState,
    pub substates: SubStateBundle,
    pub target: NavTarget,
}

pub const SCENARIO_NAMES: [&str; 5] = [
    "corridor",
    "ledge-gap",
    "water-pool",
    "jumppad-hall",
    "platform-tower",
];

pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        "corridor" => Some(corridor()),
        "ledge-gap" => Some(ledge_gap()),
        "water-pool" => Some(water_pool()),
        "jumppad-hall" => Some(jumppad_hall()),
        "platform-tower" => Some(platform_tower()),
        _ => None,
    }
}

fn standing_at(x: f32, y: f32, z: f32) -> PlayerState {
    PlayerState {
        physics: PhysicsSnapshot {
            origin: Vec3::new(x, y, z + 0.5),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn floor_slab(x0: f32, x1: f32, y0: f32, y1: f32, z: f32) -> BoxBounds {
    BoxBounds::new(Vec3::new(x0, y0, z - 16.0), Vec3::new(x1, y1, z))
}

fn area_box(x0: f32, x1: f32, y0: f32, y1: f32, z: f32) -> BoxBounds {
    BoxBounds::new(Vec3::new(x0, y0, z), Vec3::new(x1, y1, z + 160.0))
}

fn spots_from_nav(nav: &GridNav, areas: &[u32]) -> SpotRegistry {
    let spots = areas
        .iter()
        .filter_map(|area| {
            let bounds = nav.area_bounds(*area)?;
            let center = bounds.center();
            Some(TacticalSpot {
                point: Vec3::new(center.x, center.y, bounds.mins.z),
                area: *area,
            })
        })
        .collect();
    SpotRegistry::new(spots, 256.0)
}

/// A straight run: four walk-linked areas down a hallway.
fn corridor() -> Scenario {
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -192.0, 0.0),
        Vec3::new(2176.0, 192.0, 512.0),
    ));
    world.add_brush(floor_slab(-128.0, 2176.0, -192.0, 192.0, 0.0));

    let mut nav = GridNav::new();
    let mut areas = Vec::new();
    for i in 0..4 {
        let x0 = -128.0 + i as f32 * 576.0;
        areas.push(nav.add_area(area_box(x0, x0 + 576.0, -192.0, 192.0, 0.0), true));
    }
    for pair in areas.windows(2) {
        nav.link_bidir(pair[0], pair[1], TravelType::Walk, 60);
    }

    let target_area = *areas.last().expect("corridor has areas");
    let target_origin = {
        let bounds = nav.area_bounds(target_area).expect("target bounds");
        let center = bounds.center();
        Vec3::new(center.x, center.y, bounds.mins.z)
    };

    Scenario {
        name: "corridor",
        spots: spots_from_nav(&nav, &areas),
        world,
        nav,
        start: standing_at(64.0, 0.0, 0.0),
        substates: SubStateBundle::default(),
        target: NavTarget {
            area: target_area,
            origin: target_origin,
        },
    }
}

/// An upper ledge dropping onto a lower floor that leads to the target.
fn ledge_gap() -> Scenario {
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -192.0, -64.0),
        Vec3::new(1664.0, 192.0, 512.0),
    ));
    world.add_brush(floor_slab(-128.0, 512.0, -192.0, 192.0, 128.0));
    world.add_brush(BoxBounds::new(
        Vec3::new(-128.0, -192.0, -64.0),
        Vec3::new(512.0, 192.0, 128.0),
    ));
    world.add_brush(floor_slab(512.0, 1664.0, -192.0, 192.0, 0.0));

    let mut nav = GridNav::new();
    let ledge = nav.add_area(area_box(-128.0, 512.0, -192.0, 192.0, 128.0), true);
    let lower = nav.add_area(area_box(512.0, 1088.0, -192.0, 192.0, 0.0), true);
    let far = nav.add_area(area_box(1088.0, 1664.0, -192.0, 192.0, 0.0), true);
    nav.link(ledge, lower, TravelType::WalkOffLedge, 80);
    nav.link(lower, ledge, TravelType::Jump, 140);
    nav.link_bidir(lower, far, TravelType::Walk, 60);

    let target_origin = Vec3::new(1376.0, 0.0, 0.0);
    Scenario {
        name: "ledge-gap",
        spots: spots_from_nav(&nav, &[ledge, lower, far]),
        world,
        nav,
        start: standing_at(64.0, 0.0, 128.0),
        substates: SubStateBundle::default(),
        target: NavTarget {
            area: far,
            origin: target_origin,
        },
    }
}

/// A flooded mid-section the agent must swim across.
fn water_pool() -> Scenario {
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -192.0, -192.0),
        Vec3::new(1664.0, 192.0, 512.0),
    ));
    world.add_brush(floor_slab(-128.0, 384.0, -192.0, 192.0, 0.0));
    // Pool basin.
    world.add_brush(floor_slab(384.0, 1152.0, -192.0, 192.0, -160.0));
    world.add_brush(floor_slab(1152.0, 1664.0, -192.0, 192.0, 0.0));
    world.add_water(
        BoxBounds::new(Vec3::new(384.0, -192.0, -160.0), Vec3::new(1152.0, 192.0, -8.0)),
        0,
    );

    let mut nav = GridNav::new();
    let near = nav.add_area(area_box(-128.0, 384.0, -192.0, 192.0, 0.0), true);
    let pool = nav.add_area(
        BoxBounds::new(Vec3::new(384.0, -192.0, -160.0), Vec3::new(1152.0, 192.0, 32.0)),
        false,
    );
    let far = nav.add_area(area_box(1152.0, 1664.0, -192.0, 192.0, 0.0), true);
    nav.link_bidir(near, pool, TravelType::Swim, 160);
    nav.link_with_points(
        pool,
        far,
        TravelType::Swim,
        160,
        Vec3::new(1120.0, 0.0, -8.0),
        Vec3::new(1216.0, 0.0, 0.0),
    );
    nav.link(far, pool, TravelType::Swim, 160);

    Scenario {
        name: "water-pool",
        spots: spots_from_nav(&nav, &[near, far]),
        world,
        nav,
        start: standing_at(64.0, 0.0, 0.0),
        substates: SubStateBundle::default(),
        target: NavTarget {
            area: far,
            origin: Vec3::new(1408.0, 0.0, 0.0),
        },
    }
}

/// A pad launch over a dividing wall onto the landing side.
fn jumppad_hall() -> Scenario {
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -192.0, 0.0),
        Vec3::new(1664.0, 192.0, 768.0),
    ));
    world.add_brush(floor_slab(-128.0, 1664.0, -192.0, 192.0, 0.0));
    // Dividing wall the pad throws the agent over.
    world.add_brush(BoxBounds::new(
        Vec3::new(704.0, -192.0, 0.0),
        Vec3::new(768.0, 192.0, 320.0),
    ));
    world.add_jumppad(
        BoxBounds::new(Vec3::new(512.0, -64.0, 0.0), Vec3::new(640.0, 64.0, 8.0)),
        Vec3::new(260.0, 0.0, 620.0),
        Vec3::new(1100.0, 0.0, 0.0),
    );

    let mut nav = GridNav::new();
    let launch = nav.add_area(area_box(-128.0, 704.0, -192.0, 192.0, 0.0), true);
    let landing = nav.add_area(area_box(768.0, 1280.0, -192.0, 192.0, 0.0), true);
    let far = nav.add_area(area_box(1280.0, 1664.0, -192.0, 192.0, 0.0), true);
    nav.link_with_points(
        launch,
        landing,
        TravelType::JumpPad,
        120,
        Vec3::new(576.0, 0.0, 0.0),
        Vec3::new(1100.0, 0.0, 0.0),
    );
    nav.link_bidir(landing, far, TravelType::Walk, 60);

    Scenario {
        name: "jumppad-hall",
        spots: spots_from_nav(&nav, &[launch, landing, far]),
        world,
        nav,
        start: standing_at(64.0, 0.0, 0.0),
        substates: SubStateBundle::default(),
        target: NavTarget {
            area: far,
            origin: Vec3::new(1472.0, 0.0, 0.0),
        },
    }
}

/// A rising platform up to a high floor holding the target.
fn platform_tower() -> Scenario {
    let mut world = MoveWorld::new(BoxBounds::new(
        Vec3::new(-128.0, -192.0, 0.0),
        Vec3::new(1280.0, 192.0, 768.0),
    ));
    world.add_brush(floor_slab(-128.0, 512.0, -192.0, 192.0, 0.0));
    world.add_platform(
        BoxBounds::new(Vec3::new(512.0, -96.0, 0.0), Vec3::new(704.0, 96.0, 16.0)),
        272.0,
        120.0,
    );
    world.add_brush(floor_slab(704.0, 1280.0, -192.0, 192.0, 256.0));

    let mut nav = GridNav::new();
    let ground = nav.add_area(area_box(-128.0, 512.0, -192.0, 192.0, 0.0), true);
    let lift = nav.add_area(
        BoxBounds::new(Vec3::new(512.0, -96.0, 0.0), Vec3::new(704.0, 96.0, 432.0)),
        true,
    );
    let upper = nav.add_area(area_box(704.0, 1280.0, -192.0, 192.0, 256.0), true);
    nav.link_bidir(ground, lift, TravelType::Walk, 60);
    nav.link(lift, upper, TravelType::Elevator, 200);
    nav.link(upper, lift, TravelType::WalkOffLedge, 120);

    Scenario {
        name: "platform-tower",
        spots: spots_from_nav(&nav, &[ground, upper]),
        world,
        nav,
        start: standing_at(64.0, 0.0, 0.0),
        substates: SubStateBundle::default(),
        target: NavTarget {
            area: upper,
            origin: Vec3::new(992.0, 0.0, 256.0),
        },
    }
}
