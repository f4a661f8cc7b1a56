use std::collections::VecDeque;

use crate::entity::Direction;
use crate::game::Game;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Press(Direction),
    Release(Direction),
}

/// Anything that can drive the actor: a keyboard binding, a replay, a bot.
pub trait InputSource {
    /// Input to apply before the next tick, if any.
    fn poll_input(&mut self, game: &Game) -> Option<Input>;
}

/// Replays inputs at fixed ticks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    events: VecDeque<(u64, Input)>,
}

impl ScriptedInput {
    /// `events` must be sorted by tick.
    pub fn new(events: impl IntoIterator<Item = (u64, Input)>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.events.is_empty()
    }
}

impl InputSource for ScriptedInput {
    fn poll_input(&mut self, game: &Game) -> Option<Input> {
        let &(tick, input) = self.events.front()?;
        if tick > game.current_tick() {
            return None;
        }
        self.events.pop_front();
        Some(input)
    }
}
