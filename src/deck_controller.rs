use crate::config::EngineConfig;
use crate::models::{DeckState, TransitionDirection};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckPhase {
    Idle,
    Transitioning {
        direction: Direction,
        completes_at: Instant,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SwipeTrack {
    start_x: f32,
    last_x: Option<f32>,
}

/// Owns the visible card index. Index 0 is the cover card, `1..card_count`
/// address the filtered exercise list at `index - 1`.
#[derive(Debug, Clone)]
pub struct DeckController {
    visible_index: usize,
    card_count: usize,
    phase: DeckPhase,
    transition_duration: Duration,
    swipe_threshold_px: f32,
    swipe: Option<SwipeTrack>,
    keys_bound: bool,
}

impl DeckController {
    pub fn new(card_count: usize, config: &EngineConfig) -> Self {
        Self::with_timing(
            card_count,
            config.transition_duration(),
            config.swipe_threshold_px,
        )
    }

    pub fn with_timing(
        card_count: usize,
        transition_duration: Duration,
        swipe_threshold_px: f32,
    ) -> Self {
        Self {
            visible_index: 0,
            card_count: card_count.max(1),
            phase: DeckPhase::Idle,
            transition_duration,
            swipe_threshold_px,
            swipe: None,
            keys_bound: true,
        }
    }

    pub fn visible_index(&self) -> usize {
        self.visible_index
    }

    pub fn card_count(&self) -> usize {
        self.card_count
    }

    pub fn phase(&self) -> DeckPhase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, DeckPhase::Transitioning { .. })
    }

    pub fn can_go_previous(&self) -> bool {
        self.visible_index > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.visible_index + 1 < self.card_count
    }

    /// Position in the filtered list of the visible exercise card, `None` on the cover.
    pub fn exercise_position(&self) -> Option<usize> {
        self.visible_index.checked_sub(1)
    }

    /// One-based progress label pair, e.g. `(1, 6)` on the cover of a five-exercise deck.
    pub fn progress(&self) -> (usize, usize) {
        (self.visible_index + 1, self.card_count)
    }

    pub fn state(&self) -> DeckState {
        let (transition_lock, transition_direction) = match self.phase {
            DeckPhase::Idle => (false, TransitionDirection::None),
            DeckPhase::Transitioning { direction, .. } => (
                true,
                match direction {
                    Direction::Forward => TransitionDirection::Forward,
                    Direction::Backward => TransitionDirection::Backward,
                },
            ),
        };
        DeckState {
            visible_index: self.visible_index,
            card_count: self.card_count,
            transition_lock,
            transition_direction,
        }
    }

    /// Starts a forward transition. Returns `false` when the request is dropped,
    /// either because a transition is already in flight or the last card is shown.
    pub fn go_next(&mut self, now: Instant) -> bool {
        if self.is_transitioning() || !self.can_go_next() {
            return false;
        }
        self.begin_transition(Direction::Forward, now);
        true
    }

    pub fn go_previous(&mut self, now: Instant) -> bool {
        if self.is_transitioning() || !self.can_go_previous() {
            return false;
        }
        self.begin_transition(Direction::Backward, now);
        true
    }

    /// Commits a transition whose deadline has passed. Returns the new index
    /// when one was committed.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let DeckPhase::Transitioning {
            direction,
            completes_at,
        } = self.phase
        else {
            return None;
        };
        if now < completes_at {
            return None;
        }
        self.phase = DeckPhase::Idle;
        let target = match direction {
            Direction::Forward => self.visible_index + 1,
            Direction::Backward => self.visible_index.saturating_sub(1),
        };
        self.visible_index = target.min(self.card_count - 1);
        debug!(
            index = self.visible_index,
            card_count = self.card_count,
            "deck transition committed"
        );
        Some(self.visible_index)
    }

    pub fn on_swipe_start(&mut self, x: f32) {
        self.swipe = Some(SwipeTrack {
            start_x: x,
            last_x: None,
        });
    }

    pub fn on_swipe_move(&mut self, x: f32) {
        if let Some(swipe) = self.swipe.as_mut() {
            swipe.last_x = Some(x);
        }
    }

    /// Finishes a drag. A leftward drag past the threshold advances, a
    /// rightward one goes back. Returns whether a transition started.
    pub fn on_swipe_end(&mut self, now: Instant) -> bool {
        let Some(SwipeTrack {
            start_x,
            last_x: Some(end_x),
        }) = self.swipe.take()
        else {
            return false;
        };
        let displacement = end_x - start_x;
        if displacement < -self.swipe_threshold_px {
            self.go_next(now)
        } else if displacement > self.swipe_threshold_px {
            self.go_previous(now)
        } else {
            false
        }
    }

    pub fn bind_keys(&mut self) {
        self.keys_bound = true;
    }

    pub fn release_keys(&mut self) {
        self.keys_bound = false;
    }

    pub fn keys_bound(&self) -> bool {
        self.keys_bound
    }

    pub fn on_key_arrow_left(&mut self, now: Instant) -> bool {
        self.keys_bound && self.go_previous(now)
    }

    pub fn on_key_arrow_right(&mut self, now: Instant) -> bool {
        self.keys_bound && self.go_next(now)
    }

    /// Adopts a new card count after the filtered list changed. An index past
    /// the end is clamped at once, without animation. Returns whether the
    /// visible index moved.
    pub fn reconcile(&mut self, new_card_count: usize) -> bool {
        self.card_count = new_card_count.max(1);
        let clamped = self.visible_index >= self.card_count;
        if clamped {
            let previous = self.visible_index;
            self.visible_index = self.card_count - 1;
            self.phase = DeckPhase::Idle;
            debug!(
                from = previous,
                to = self.visible_index,
                card_count = self.card_count,
                "deck index clamped after filter change"
            );
            return true;
        }
        if let DeckPhase::Transitioning {
            direction: Direction::Forward,
            ..
        } = self.phase
        {
            if !self.can_go_next() {
                self.phase = DeckPhase::Idle;
            }
        }
        false
    }

    /// Drops any in-flight gesture or transition, keeping the index.
    pub fn cancel_pending(&mut self) {
        self.phase = DeckPhase::Idle;
        self.swipe = None;
    }

    fn begin_transition(&mut self, direction: Direction, now: Instant) {
        debug!(
            ?direction,
            from = self.visible_index,
            "deck transition started"
        );
        self.phase = DeckPhase::Transitioning {
            direction,
            completes_at: now + self.transition_duration,
        };
    }
}


#[cfg(test)]
mod proptests {
    use super::DeckController;
    use proptest::prelude::*;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone)]
    enum Op {
        Next,
        Previous,
        Reconcile(usize),
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Next),
            Just(Op::Previous),
            (0usize..12).prop_map(Op::Reconcile),
            (0u64..700).prop_map(Op::Advance),
        ]
    }

    proptest! {
        /// The visible index stays inside the deck whatever the call order
        #[test]
        fn prop_index_stays_in_range(
            initial in 1usize..10,
            ops in prop::collection::vec(op(), 0..80),
        ) {
            let mut deck = DeckController::with_timing(initial, Duration::from_millis(300), 50.0);
            let mut now = Instant::now();
            for op in ops {
                match op {
                    Op::Next => { deck.go_next(now); }
                    Op::Previous => { deck.go_previous(now); }
                    Op::Reconcile(count) => { deck.reconcile(count); }
                    Op::Advance(ms) => {
                        now += Duration::from_millis(ms);
                        deck.poll(now);
                    }
                }
                prop_assert!(deck.card_count() >= 1);
                prop_assert!(deck.visible_index() < deck.card_count());
            }
        }
    }
}
