use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::entity::Adversary;
use crate::grid::{TileGrid, TileId, TileState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Adversaries can be touched without harm and get chased off instead.
    #[serde(alias = "Invincible")]
    Vulnerability,
    /// Adversaries stop moving.
    #[serde(alias = "ZAWARUDO")]
    TimeFreeze,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Vulnerability, EffectKind::TimeFreeze];
}

/// Which item kind a level hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SelectorName", into = "SelectorName")]
pub enum PowerupSelector {
    #[default]
    Random,
    Fixed(EffectKind),
}

impl PowerupSelector {
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> EffectKind {
        match self {
            PowerupSelector::Random => EffectKind::ALL[rng.gen_range(0..EffectKind::ALL.len())],
            PowerupSelector::Fixed(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SelectorName {
    Random,
    #[serde(alias = "Invincible")]
    Vulnerability,
    #[serde(alias = "ZAWARUDO")]
    TimeFreeze,
}

impl From<SelectorName> for PowerupSelector {
    fn from(name: SelectorName) -> Self {
        match name {
            SelectorName::Random => PowerupSelector::Random,
            SelectorName::Vulnerability => PowerupSelector::Fixed(EffectKind::Vulnerability),
            SelectorName::TimeFreeze => PowerupSelector::Fixed(EffectKind::TimeFreeze),
        }
    }
}

impl From<PowerupSelector> for SelectorName {
    fn from(selector: PowerupSelector) -> Self {
        match selector {
            PowerupSelector::Random => SelectorName::Random,
            PowerupSelector::Fixed(EffectKind::Vulnerability) => SelectorName::Vulnerability,
            PowerupSelector::Fixed(EffectKind::TimeFreeze) => SelectorName::TimeFreeze,
        }
    }
}

/// A collectable item lying on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerItem {
    pub tile: TileId,
    pub kind: EffectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    Inactive,
    Active { kind: EffectKind, remaining: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerupEvent {
    Activated(EffectKind),
    Expired(EffectKind),
    /// The item's tile got captured before anyone picked it up.
    ItemLost(PowerItem),
    /// The countdown ran out; the caller should place a new item.
    SpawnRequested,
}

#[derive(Debug, Clone)]
pub struct PowerupEffectManager {
    state: EffectState,
    item: Option<PowerItem>,
    spawn_countdown: u32,
    fps: u32,
    duration: u32,
    max_spawn_delay_secs: u32,
}

impl PowerupEffectManager {
    pub fn new<R: Rng + ?Sized>(sim: &SimConfig, rng: &mut R) -> Self {
        let mut manager = Self {
            state: EffectState::Inactive,
            item: None,
            spawn_countdown: 0,
            fps: sim.fps,
            duration: sim.effect_duration_ticks(),
            max_spawn_delay_secs: sim.max_spawn_delay_secs,
        };
        manager.spawn_countdown = manager.draw_countdown(rng);
        manager
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn active_kind(&self) -> Option<EffectKind> {
        match self.state {
            EffectState::Active { kind, .. } => Some(kind),
            EffectState::Inactive => None,
        }
    }

    pub fn remaining_ticks(&self) -> u32 {
        match self.state {
            EffectState::Active { remaining, .. } => remaining,
            EffectState::Inactive => 0,
        }
    }

    /// Whole seconds left, as a countdown display would show them.
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_ticks() / self.fps.max(1)
    }

    pub fn item(&self) -> Option<PowerItem> {
        self.item
    }

    pub fn spawn_countdown(&self) -> u32 {
        self.spawn_countdown
    }

    pub fn place_item(&mut self, item: PowerItem) {
        debug!(row = item.tile.row, col = item.tile.col, kind = ?item.kind, "power item placed");
        self.item = Some(item);
    }

    /// One tick: expire the running effect, then resolve the item, then run
    /// the spawn countdown.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        grid: &TileGrid,
        actor_tile: TileId,
        adversaries: &mut [Adversary],
        rng: &mut R,
    ) -> Vec<PowerupEvent> {
        let mut events = Vec::new();

        if let EffectState::Active { kind, remaining } = &mut self.state {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                let kind = *kind;
                self.state = EffectState::Inactive;
                restore(kind, adversaries);
                info!(?kind, "power effect expired");
                events.push(PowerupEvent::Expired(kind));
            }
        }

        if let Some(item) = self.item {
            if item.tile == actor_tile {
                self.item = None;
                self.activate(item.kind, adversaries);
                events.push(PowerupEvent::Activated(item.kind));
            } else if grid.state(item.tile) == TileState::Captured {
                self.item = None;
                debug!(row = item.tile.row, col = item.tile.col, "power item captured away");
                events.push(PowerupEvent::ItemLost(item));
            }
        } else if self.state == EffectState::Inactive {
            self.spawn_countdown = self.spawn_countdown.saturating_sub(1);
            if self.spawn_countdown == 0 {
                self.spawn_countdown = self.draw_countdown(rng);
                events.push(PowerupEvent::SpawnRequested);
            }
        }

        events
    }

    fn activate(&mut self, kind: EffectKind, adversaries: &mut [Adversary]) {
        if let Some(previous) = self.active_kind() {
            restore(previous, adversaries);
        }
        for adversary in adversaries.iter_mut() {
            match kind {
                EffectKind::Vulnerability => adversary.set_vulnerable(true),
                EffectKind::TimeFreeze => adversary.freeze(),
            }
        }
        self.state = EffectState::Active {
            kind,
            remaining: self.duration,
        };
        info!(?kind, ticks = self.duration, "power effect active");
    }

    fn draw_countdown<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(1..=self.max_spawn_delay_secs.max(1)) * self.fps
    }
}

fn restore(kind: EffectKind, adversaries: &mut [Adversary]) {
    for adversary in adversaries.iter_mut() {
        match kind {
            EffectKind::Vulnerability => adversary.set_vulnerable(false),
            EffectKind::TimeFreeze => adversary.unfreeze(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AdversaryKind, Direction, MovementFlags, Position};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sim() -> SimConfig {
        SimConfig {
            fps: 10,
            effect_duration_secs: 2,
            max_spawn_delay_secs: 3,
            ..Default::default()
        }
    }

    fn adversaries() -> Vec<Adversary> {
        vec![Adversary::new(
            AdversaryKind::Plain,
            Position::new(50, 50),
            MovementFlags::diagonal(Direction::Up, Direction::Left),
        )]
    }

    #[test]
    fn test_countdown_requests_spawn() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = TileGrid::bordered(6, 6);
        let mut manager = PowerupEffectManager::new(&sim(), &mut rng);
        let countdown = manager.spawn_countdown();
        assert!((10..=30).contains(&countdown));
        assert_eq!(countdown % 10, 0);

        let mut adversaries = adversaries();
        for _ in 0..countdown - 1 {
            let events = manager.advance(&grid, TileId::new(0, 0), &mut adversaries, &mut rng);
            assert!(events.is_empty());
        }
        let events = manager.advance(&grid, TileId::new(0, 0), &mut adversaries, &mut rng);
        assert_eq!(events, vec![PowerupEvent::SpawnRequested]);
        assert!(manager.spawn_countdown() >= 10);
    }

    #[test]
    fn test_time_freeze_stops_and_restores() {
        let mut rng = StdRng::seed_from_u64(4);
        let grid = TileGrid::bordered(6, 6);
        let mut manager = PowerupEffectManager::new(&sim(), &mut rng);
        let mut adversaries = adversaries();
        let before = adversaries[0].movement;

        let tile = TileId::new(2, 2);
        manager.place_item(PowerItem {
            tile,
            kind: EffectKind::TimeFreeze,
        });
        let events = manager.advance(&grid, tile, &mut adversaries, &mut rng);
        assert_eq!(events, vec![PowerupEvent::Activated(EffectKind::TimeFreeze)]);
        assert!(adversaries[0].movement.is_idle());
        assert_eq!(manager.remaining_ticks(), 20);
        assert_eq!(manager.remaining_seconds(), 2);
        assert_eq!(manager.item(), None);

        for _ in 0..19 {
            manager.advance(&grid, tile, &mut adversaries, &mut rng);
        }
        assert!(adversaries[0].is_frozen());
        let events = manager.advance(&grid, tile, &mut adversaries, &mut rng);
        assert_eq!(events, vec![PowerupEvent::Expired(EffectKind::TimeFreeze)]);
        assert_eq!(adversaries[0].movement, before);
        assert_eq!(manager.state(), EffectState::Inactive);
    }

    #[test]
    fn test_vulnerability_toggles_flag() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = TileGrid::bordered(6, 6);
        let mut manager = PowerupEffectManager::new(&sim(), &mut rng);
        let mut adversaries = adversaries();

        let tile = TileId::new(3, 3);
        manager.place_item(PowerItem {
            tile,
            kind: EffectKind::Vulnerability,
        });
        manager.advance(&grid, tile, &mut adversaries, &mut rng);
        assert!(adversaries[0].is_vulnerable());
        assert_eq!(manager.active_kind(), Some(EffectKind::Vulnerability));

        for _ in 0..20 {
            manager.advance(&grid, tile, &mut adversaries, &mut rng);
        }
        assert!(!adversaries[0].is_vulnerable());
        assert_eq!(manager.active_kind(), None);
    }

    #[test]
    fn test_captured_item_is_lost() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut grid = TileGrid::bordered(6, 6);
        let mut manager = PowerupEffectManager::new(&sim(), &mut rng);
        let mut adversaries = adversaries();

        let item = PowerItem {
            tile: TileId::new(2, 3),
            kind: EffectKind::Vulnerability,
        };
        manager.place_item(item);
        assert!(manager
            .advance(&grid, TileId::new(0, 0), &mut adversaries, &mut rng)
            .is_empty());

        grid.set_state(item.tile, TileState::Captured);
        let events = manager.advance(&grid, TileId::new(0, 0), &mut adversaries, &mut rng);
        assert_eq!(events, vec![PowerupEvent::ItemLost(item)]);
        assert_eq!(manager.item(), None);
        assert!(!adversaries[0].is_vulnerable());
    }

    #[test]
    fn test_selector_parses_both_spellings() {
        let fixed: PowerupSelector = serde_json::from_str("\"Invincible\"").unwrap();
        assert_eq!(fixed, PowerupSelector::Fixed(EffectKind::Vulnerability));
        let fixed: PowerupSelector = serde_json::from_str("\"time_freeze\"").unwrap();
        assert_eq!(fixed, PowerupSelector::Fixed(EffectKind::TimeFreeze));
        let random: PowerupSelector = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(random, PowerupSelector::Random);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            PowerupSelector::Fixed(EffectKind::TimeFreeze).pick(&mut rng),
            EffectKind::TimeFreeze
        );
    }
}
