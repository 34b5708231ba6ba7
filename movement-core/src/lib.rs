pub mod command;
pub mod constants;
pub mod env;
pub mod error;
pub mod math;
pub mod nav;
pub mod rng;
pub mod sim;
pub mod snapshot;
pub mod substate;
pub mod tactical;
pub mod trace;

pub use command::BotInput;
pub use env::{FrameEventSink, FrameEvents, PredictedEvent, SimEnvironment, TriggerKind};
pub use error::{DecodeError, ViolationCode};
pub use math::Vec3;
pub use nav::{NavQuery, Reach, TravelType};
pub use snapshot::{EntityId, PhysicsSnapshot, PlayerMoveState, PlayerState};
pub use substate::SubStateBundle;
pub use tactical::{SpotCandidate, SpotProfile, SpotQuery};
pub use trace::{BoxBounds, TraceResult};
