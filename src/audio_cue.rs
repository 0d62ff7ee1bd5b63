use crate::tone_synth::{encode_wav, render_tones, Tone};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

const MAX_LOG_RECORDS: usize = 64;
const SCRATCH_SLOTS: u64 = 4;

const START_TONES: [Tone; 2] = [Tone::new(528.0, 1.0, 0.0), Tone::new(660.0, 0.8, 0.2)];
const INTERVAL_TONES: [Tone; 1] = [Tone::new(440.0, 0.6, 0.0)];
const END_TONES: [Tone; 3] = [
    Tone::new(528.0, 1.0, 0.0),
    Tone::new(660.0, 0.8, 0.2),
    Tone::new(792.0, 1.0, 0.4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Start,
    Interval,
    End,
}

impl Cue {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            Cue::Start => &START_TONES,
            Cue::Interval => &INTERVAL_TONES,
            Cue::End => &END_TONES,
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    ContextUnavailable(String),
    #[error("audio output could not be resumed: {0}")]
    ResumeFailed(String),
    #[error("audio scratch file error: {0}")]
    Io(#[from] io::Error),
    #[error("audio player failed: {0}")]
    Player(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Suspended,
}

/// A live audio output. Opening one is expensive, so the engine keeps a
/// single context for its whole lifetime.
pub trait AudioContext: fmt::Debug {
    fn state(&self) -> ContextState;
    fn resume(&mut self) -> Result<(), AudioError>;
    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError>;
}

pub trait AudioBackend {
    type Context: AudioContext;

    fn open_context(&mut self) -> Result<Self::Context, AudioError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    System,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CuePlaybackReason {
    Played,
    Muted,
    PlaybackDisabled,
    ContextUnavailable,
    PlaybackFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePlaybackRecord {
    pub cue: Cue,
    pub exercise_id: Option<u32>,
    pub played: bool,
    pub reason: CuePlaybackReason,
    pub timestamp: SystemTime,
}

/// Plays timer cues, fire-and-forget. Failures are logged and recorded, never
/// returned to the caller.
#[derive(Debug)]
pub struct AudioCueEngine<B: AudioBackend> {
    backend: B,
    context: Option<B::Context>,
    global_mute: bool,
    playback_mode: PlaybackMode,
    log: Vec<CuePlaybackRecord>,
}

impl<B: AudioBackend> AudioCueEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_playback_mode(backend, PlaybackMode::System)
    }

    pub fn with_playback_mode(backend: B, playback_mode: PlaybackMode) -> Self {
        Self {
            backend,
            context: None,
            global_mute: false,
            playback_mode,
            log: Vec::new(),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.global_mute
    }

    pub fn set_global_mute(&mut self, muted: bool) {
        self.global_mute = muted;
    }

    pub fn toggle_global_mute(&mut self) -> bool {
        self.global_mute = !self.global_mute;
        self.global_mute
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn play_cue(&mut self, cue: Cue, exercise_id: Option<u32>) -> CuePlaybackRecord {
        let reason = if self.global_mute {
            CuePlaybackReason::Muted
        } else if self.playback_mode == PlaybackMode::Disabled {
            CuePlaybackReason::PlaybackDisabled
        } else {
            self.play_through_context(cue)
        };

        let record = CuePlaybackRecord {
            cue,
            exercise_id,
            played: reason == CuePlaybackReason::Played,
            reason,
            timestamp: SystemTime::now(),
        };
        if self.log.len() == MAX_LOG_RECORDS {
            self.log.remove(0);
        }
        self.log.push(record.clone());
        record
    }

    pub fn logs(&self) -> &[CuePlaybackRecord] {
        &self.log
    }

    pub fn take_logs(&mut self) -> Vec<CuePlaybackRecord> {
        std::mem::take(&mut self.log)
    }

    fn play_through_context(&mut self, cue: Cue) -> CuePlaybackReason {
        if self.context.is_none() {
            match self.backend.open_context() {
                Ok(context) => self.context = Some(context),
                Err(err) => {
                    warn!(?cue, error = %err, "dropping cue, audio output unavailable");
                    return CuePlaybackReason::ContextUnavailable;
                }
            }
        }
        let Some(context) = self.context.as_mut() else {
            return CuePlaybackReason::ContextUnavailable;
        };

        if context.state() == ContextState::Suspended {
            if let Err(err) = context.resume() {
                warn!(?cue, error = %err, "dropping cue, audio output suspended");
                return CuePlaybackReason::ContextUnavailable;
            }
        }

        match context.play(cue.tones()) {
            Ok(()) => {
                debug!(?cue, "cue played");
                CuePlaybackReason::Played
            }
            Err(err) => {
                warn!(?cue, error = %err, "cue playback failed");
                CuePlaybackReason::PlaybackFailed
            }
        }
    }
}

/// Plays cues through the platform's command line audio player.
#[derive(Debug, Clone)]
pub struct SystemAudioBackend {
    scratch_dir: PathBuf,
    sample_rate: u32,
}

impl SystemAudioBackend {
    pub fn new(scratch_dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            sample_rate,
        }
    }
}

impl AudioBackend for SystemAudioBackend {
    type Context = SystemAudioContext;

    fn open_context(&mut self) -> Result<Self::Context, AudioError> {
        let player = find_player().ok_or_else(|| {
            AudioError::ContextUnavailable("no audio player found on PATH".to_string())
        })?;
        fs::create_dir_all(&self.scratch_dir)?;
        debug!(player, dir = %self.scratch_dir.display(), "audio output opened");
        Ok(SystemAudioContext {
            player,
            scratch_dir: self.scratch_dir.clone(),
            sample_rate: self.sample_rate,
            cues_played: 0,
        })
    }
}

#[derive(Debug)]
pub struct SystemAudioContext {
    player: &'static str,
    scratch_dir: PathBuf,
    sample_rate: u32,
    cues_played: u64,
}

impl AudioContext for SystemAudioContext {
    /// The scratch directory vanishing (temp cleanup) is this output's
    /// suspended state.
    fn state(&self) -> ContextState {
        if self.scratch_dir.is_dir() {
            ContextState::Running
        } else {
            ContextState::Suspended
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|err| AudioError::ResumeFailed(err.to_string()))
    }

    fn play(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        let samples = render_tones(tones, self.sample_rate);
        let slot = self.cues_played % SCRATCH_SLOTS;
        self.cues_played = self.cues_played.wrapping_add(1);
        let path = self.scratch_dir.join(format!("cue-{slot}.wav"));
        fs::write(&path, encode_wav(&samples, self.sample_rate))?;
        spawn_player(self.player, &path)
    }
}

fn spawn_player(player: &str, path: &Path) -> Result<(), AudioError> {
    let mut child = Command::new(player)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| AudioError::Player(format!("{player}: {err}")))?;
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

/// Command line WAV players by platform. Windows ships none, so cues there
/// always report `ContextUnavailable`.
fn player_candidates() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &["afplay"]
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        &["paplay", "aplay"]
    }
    #[cfg(not(unix))]
    {
        &[]
    }
}

fn executable_name(player: &str) -> String {
    format!("{player}{}", std::env::consts::EXE_SUFFIX)
}

fn find_player() -> Option<&'static str> {
    let paths = std::env::var_os("PATH")?;
    player_candidates().iter().copied().find(|candidate| {
        let file_name = executable_name(candidate);
        std::env::split_paths(&paths).any(|dir| dir.join(&file_name).is_file())
    })
}
