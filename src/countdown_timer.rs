use crate::audio_cue::Cue;
use crate::models::{TimerState, TimerStatus};
use regex::Regex;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::debug;

const SECONDS_PER_MINUTE: u32 = 60;

/// First integer directly followed by a word starting with "minut".
static DURATION_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*minut").expect("Invalid duration regex"));

/// Reads the planned length of an exercise from its human duration text, e.g.
/// `"8 minuter"`. Text without a minute count, or one too large to hold in
/// seconds, yields 0, which marks the timer unavailable.
pub fn parse_duration(text: &str) -> u32 {
    DURATION_MINUTES
        .captures(text)
        .and_then(|captures| captures[1].parse::<u32>().ok())
        .and_then(|minutes| minutes.checked_mul(SECONDS_PER_MINUTE))
        .unwrap_or(0)
}

/// `m:ss`, as shown on the timer face.
pub fn format_time(seconds: u32) -> String {
    format!(
        "{}:{:02}",
        seconds / SECONDS_PER_MINUTE,
        seconds % SECONDS_PER_MINUTE
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started { fresh: bool },
    Paused,
    Reset,
    Tick { elapsed_seconds: u32 },
    Chime { minute: u32 },
    Finished,
}

impl TimerEvent {
    pub fn cue(&self) -> Option<Cue> {
        match self {
            TimerEvent::Started { fresh: true } => Some(Cue::Start),
            TimerEvent::Chime { .. } => Some(Cue::Interval),
            TimerEvent::Finished => Some(Cue::End),
            _ => None,
        }
    }
}

/// Countdown for the exercise card on screen. The next tick is an explicit
/// deadline; pausing, resetting or switching exercise clears it, so a stale
/// tick can never land on another exercise.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    exercise_id: Option<u32>,
    total_seconds: u32,
    elapsed_seconds: u32,
    status: TimerStatus,
    last_chime_minute: u32,
    next_tick_at: Option<Instant>,
    tick_interval: Duration,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CountdownTimer {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            exercise_id: None,
            total_seconds: 0,
            elapsed_seconds: 0,
            status: TimerStatus::Stopped,
            last_chime_minute: 0,
            next_tick_at: None,
            tick_interval,
        }
    }

    pub fn exercise_id(&self) -> Option<u32> {
        self.exercise_id
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.total_seconds.saturating_sub(self.elapsed_seconds)
    }

    pub fn last_chime_minute(&self) -> u32 {
        self.last_chime_minute
    }

    pub fn progress(&self) -> f32 {
        if self.total_seconds == 0 {
            0.0
        } else {
            self.elapsed_seconds as f32 / self.total_seconds as f32
        }
    }

    pub fn is_available(&self) -> bool {
        self.total_seconds > 0
    }

    pub fn has_pending_tick(&self) -> bool {
        self.next_tick_at.is_some()
    }

    pub fn state(&self) -> TimerState {
        TimerState {
            exercise_id: self.exercise_id,
            status: self.status,
            total_seconds: self.total_seconds,
            elapsed_seconds: self.elapsed_seconds,
            remaining_seconds: self.remaining_seconds(),
            remaining_label: format_time(self.remaining_seconds()),
            progress: self.progress(),
            last_chime_minute: self.last_chime_minute,
        }
    }

    /// Points the timer at the exercise now on screen. A different identity
    /// (including none, for the cover card) force-resets the timer. Returns
    /// whether the identity changed.
    pub fn show_exercise(&mut self, exercise_id: Option<u32>, duration_text: &str) -> bool {
        if self.exercise_id == exercise_id {
            return false;
        }
        self.reset();
        self.exercise_id = exercise_id;
        self.total_seconds = if exercise_id.is_some() {
            parse_duration(duration_text)
        } else {
            0
        };
        debug!(
            exercise_id = ?exercise_id,
            total_seconds = self.total_seconds,
            "timer bound to exercise"
        );
        true
    }

    pub fn play(&mut self, now: Instant) -> Option<TimerEvent> {
        if !self.is_available() {
            return None;
        }
        match self.status {
            TimerStatus::Stopped | TimerStatus::Paused => {
                let fresh = self.elapsed_seconds == 0;
                self.status = TimerStatus::Running;
                self.next_tick_at = Some(now + self.tick_interval);
                debug!(
                    exercise_id = ?self.exercise_id,
                    elapsed = self.elapsed_seconds,
                    fresh,
                    "timer running"
                );
                Some(TimerEvent::Started { fresh })
            }
            TimerStatus::Running | TimerStatus::Finished => None,
        }
    }

    pub fn pause(&mut self) -> Option<TimerEvent> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.status = TimerStatus::Paused;
        self.next_tick_at = None;
        debug!(elapsed = self.elapsed_seconds, "timer paused");
        Some(TimerEvent::Paused)
    }

    /// The card's single play/pause button.
    pub fn toggle_play_pause(&mut self, now: Instant) -> Option<TimerEvent> {
        if self.status == TimerStatus::Running {
            self.pause()
        } else {
            self.play(now)
        }
    }

    pub fn reset(&mut self) -> TimerEvent {
        self.status = TimerStatus::Stopped;
        self.elapsed_seconds = 0;
        self.last_chime_minute = 0;
        self.next_tick_at = None;
        TimerEvent::Reset
    }

    /// Advances the clock by exactly one second. Does nothing unless running.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        if self.elapsed_seconds >= self.total_seconds {
            self.elapsed_seconds = self.total_seconds;
            self.status = TimerStatus::Finished;
            self.next_tick_at = None;
            debug!(exercise_id = ?self.exercise_id, "timer finished");
            return vec![
                TimerEvent::Tick {
                    elapsed_seconds: self.elapsed_seconds,
                },
                TimerEvent::Finished,
            ];
        }

        let mut events = vec![TimerEvent::Tick {
            elapsed_seconds: self.elapsed_seconds,
        }];
        let current_minute = self.elapsed_seconds / SECONDS_PER_MINUTE;
        if current_minute > 0 && current_minute > self.last_chime_minute {
            self.last_chime_minute = current_minute;
            events.push(TimerEvent::Chime {
                minute: current_minute,
            });
        }
        events
    }

    /// Fires every tick that has come due by `now`, one interval apart.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Some(due) = self.next_tick_at {
            if now < due {
                break;
            }
            events.extend(self.tick());
            if self.status == TimerStatus::Running {
                self.next_tick_at = Some(due + self.tick_interval);
            }
        }
        events
    }
}
