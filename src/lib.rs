pub mod collision;
pub mod config;
pub mod entity;
pub mod error;
pub mod fill;
pub mod game;
pub mod grid;
pub mod input;
pub mod level;
pub mod powerup;
pub mod reflection;
pub mod trail;

pub use collision::DeathCause;
pub use config::{GameConfig, SimConfig};
pub use entity::{Actor, Adversary, AdversaryKind, Direction, MovementFlags, Position};
pub use error::{ConfigError, LoadError, MapDefect, SpawnInvalid};
pub use fill::CaptureReport;
pub use game::{Game, GameState, Session, Status, TickReport};
pub use grid::{Neighbor, TileGrid, TileId, TileState};
pub use input::{Input, InputSource, ScriptedInput};
pub use level::{AdversarySpec, Campaign, Level, World};
pub use powerup::{EffectKind, PowerItem, PowerupEffectManager, PowerupEvent, PowerupSelector};
pub use trail::PathTracker;
