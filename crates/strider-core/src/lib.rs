// strider-core: Types, traits, config, time, errors and math shared by the Strider locomotion crates.

pub mod config;
pub mod error;
pub mod math;
pub mod time;
pub mod traits;
pub mod types;

pub use config::{
    GroundMode, IkConfig, LayoutConfig, LocomotionConfig, PlacementConfig, StabilizerConfig,
    StepConfig, SteeringConfig, TickConfig,
};
pub use error::{ConfigError, RigError, StriderError};
pub use time::{SimTime, TickClock};
pub use traits::RayProbe;
pub use types::{LegId, Pose, RayHit};
