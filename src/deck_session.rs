use crate::app_error::AppError;
use crate::audio_cue::{AudioBackend, AudioCueEngine, Cue};
use crate::card_renderer::{render_card, share_text, Card, RenderContext};
use crate::catalog_loader::CatalogResult;
use crate::config::EngineConfig;
use crate::countdown_timer::{CountdownTimer, TimerEvent};
use crate::deck_controller::DeckController;
use crate::filter_pipeline::{category_counts, compute_visible_list, resolve_favorites_only};
use crate::models::{
    Category, DeckState, ExerciseRecord, FilterState, Settings, TimerState,
};
use crate::preference_store::PreferenceStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum CatalogState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSnapshot {
    pub catalog: CatalogState,
    pub deck: DeckState,
    pub card: Card,
    pub timer: TimerState,
    pub filter: FilterState,
    pub progress_current: usize,
    pub progress_total: usize,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub category_counts: HashMap<Category, usize>,
    pub muted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub card_changed: bool,
    pub timer_events: Vec<TimerEvent>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        !self.card_changed && self.timer_events.is_empty()
    }
}

/// Page-level coordinator: owns the filter, the deck, the timer of the card
/// on screen and the cue engine, and keeps them consistent with each other.
#[derive(Debug)]
pub struct DeckSession<B: AudioBackend> {
    config: EngineConfig,
    preferences: PreferenceStore,
    catalog: Vec<ExerciseRecord>,
    catalog_state: CatalogState,
    filter: FilterState,
    favorite_ids: HashSet<u32>,
    completed_ids: HashSet<u32>,
    visible: Vec<ExerciseRecord>,
    deck: DeckController,
    timer: CountdownTimer,
    cues: AudioCueEngine<B>,
    mounted: bool,
}

impl<B: AudioBackend> DeckSession<B> {
    pub fn new(config: EngineConfig, preferences: PreferenceStore, cues: AudioCueEngine<B>) -> Self {
        let favorite_ids = preferences.favorite_ids();
        let completed_ids = preferences.completed_ids();
        Self {
            deck: DeckController::new(1, &config),
            timer: CountdownTimer::new(config.tick_interval()),
            config,
            preferences,
            catalog: Vec::new(),
            catalog_state: CatalogState::Loading,
            filter: FilterState::default(),
            favorite_ids,
            completed_ids,
            visible: Vec::new(),
            cues,
            mounted: true,
        }
    }

    pub fn catalog_state(&self) -> &CatalogState {
        &self.catalog_state
    }

    pub fn filter(&self) -> FilterState {
        self.filter
    }

    pub fn visible_exercises(&self) -> &[ExerciseRecord] {
        &self.visible
    }

    pub fn deck(&self) -> &DeckController {
        &self.deck
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn cues(&self) -> &AudioCueEngine<B> {
        &self.cues
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Accepts the catalog loader's result. A failure is terminal for this
    /// session: the deck degrades to the cover card alone.
    pub fn load_catalog(&mut self, result: CatalogResult<Vec<ExerciseRecord>>) {
        match result {
            Ok(exercises) => {
                info!(count = exercises.len(), "catalog ready");
                self.catalog = exercises;
                self.catalog_state = CatalogState::Ready;
            }
            Err(err) => {
                let error = AppError::from(&err);
                warn!(error = %err, "catalog failed to load");
                self.catalog.clear();
                self.catalog_state = CatalogState::Failed(error.message().to_string());
            }
        }
        self.recompute();
    }

    pub fn select_category(&mut self, category: Option<Category>) {
        self.filter.selected_category = category;
        self.recompute();
    }

    pub fn toggle_favorites_only(&mut self) -> bool {
        self.filter.favorites_only = !self.filter.favorites_only;
        self.recompute();
        self.filter.favorites_only
    }

    pub fn toggle_favorite(&mut self, exercise_id: u32) -> bool {
        let now_favorite = self.preferences.toggle_favorite(exercise_id);
        self.favorite_ids = self.preferences.favorite_ids();
        self.recompute();
        now_favorite
    }

    pub fn toggle_completed(&mut self, exercise_id: u32) -> bool {
        let now_completed = self.preferences.toggle_completed(exercise_id);
        self.completed_ids = self.preferences.completed_ids();
        now_completed
    }

    pub fn settings(&self) -> Settings {
        self.preferences.settings()
    }

    pub fn save_settings(&self, settings: &Settings) {
        self.preferences.save_settings(settings);
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.cues.toggle_global_mute()
    }

    pub fn go_next(&mut self, now: Instant) -> bool {
        self.mounted && self.deck.go_next(now)
    }

    pub fn go_previous(&mut self, now: Instant) -> bool {
        self.mounted && self.deck.go_previous(now)
    }

    pub fn swipe_start(&mut self, x: f32) {
        if self.mounted {
            self.deck.on_swipe_start(x);
        }
    }

    pub fn swipe_move(&mut self, x: f32) {
        if self.mounted {
            self.deck.on_swipe_move(x);
        }
    }

    pub fn swipe_end(&mut self, now: Instant) -> bool {
        self.mounted && self.deck.on_swipe_end(now)
    }

    pub fn key_arrow_left(&mut self, now: Instant) -> bool {
        self.deck.on_key_arrow_left(now)
    }

    pub fn key_arrow_right(&mut self, now: Instant) -> bool {
        self.deck.on_key_arrow_right(now)
    }

    pub fn toggle_play_pause(&mut self, now: Instant) -> Option<TimerEvent> {
        let event = self.timer.toggle_play_pause(now)?;
        self.dispatch_cues(&[event]);
        Some(event)
    }

    pub fn reset_timer(&mut self) -> TimerEvent {
        self.timer.reset()
    }

    /// Drives both schedules: commits a due card transition, then fires due
    /// timer ticks and their cues.
    pub fn poll(&mut self, now: Instant) -> SessionUpdate {
        let mut update = SessionUpdate::default();
        if !self.mounted {
            return update;
        }
        if self.deck.poll(now).is_some() {
            update.card_changed = true;
            self.sync_timer();
        }
        update.timer_events = self.timer.poll(now);
        self.dispatch_cues(&update.timer_events);
        update
    }

    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.deck = DeckController::new(self.visible.len() + 1, &self.config);
        self.mounted = true;
        self.sync_timer();
        info!("deck mounted");
    }

    /// Tears the deck down: keys released, pending transition and tick cancelled.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.deck.release_keys();
        self.deck.cancel_pending();
        self.timer.show_exercise(None, "");
        self.mounted = false;
        info!("deck unmounted");
    }

    pub fn current_card(&self) -> Card {
        render_card(
            self.deck.visible_index(),
            &self.visible,
            &self.render_context(),
        )
    }

    pub fn share_text(&self, exercise_id: u32) -> Option<String> {
        self.catalog
            .iter()
            .find(|record| record.id == exercise_id)
            .map(|record| share_text(record, &self.config.base_url))
    }

    pub fn snapshot(&self) -> DeckSnapshot {
        let (progress_current, progress_total) = self.deck.progress();
        DeckSnapshot {
            catalog: self.catalog_state.clone(),
            deck: self.deck.state(),
            card: self.current_card(),
            timer: self.timer.state(),
            filter: self.filter,
            progress_current,
            progress_total,
            can_go_previous: self.deck.can_go_previous(),
            can_go_next: self.deck.can_go_next(),
            category_counts: category_counts(&self.catalog),
            muted: self.cues.is_muted(),
        }
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            filter: &self.filter,
            favorite_ids: &self.favorite_ids,
            completed_ids: &self.completed_ids,
            catalog: &self.catalog,
        }
    }

    fn recompute(&mut self) {
        let resolved = resolve_favorites_only(self.filter, &self.favorite_ids);
        if resolved != self.filter {
            info!("favorites-only turned off, no favorites left");
            self.filter = resolved;
        }
        self.visible = compute_visible_list(&self.catalog, &self.filter, &self.favorite_ids);
        self.deck.reconcile(self.visible.len() + 1);
        debug!(
            visible = self.visible.len(),
            index = self.deck.visible_index(),
            "visible list recomputed"
        );
        self.sync_timer();
    }

    fn sync_timer(&mut self) {
        if !self.mounted {
            return;
        }
        let displayed = self
            .deck
            .exercise_position()
            .and_then(|position| self.visible.get(position));
        match displayed {
            Some(record) => self.timer.show_exercise(Some(record.id), &record.duration),
            None => self.timer.show_exercise(None, ""),
        };
    }

    fn dispatch_cues(&mut self, events: &[TimerEvent]) {
        let exercise_id = self.timer.exercise_id();
        for cue in coalesce_cues(events) {
            self.cues.play_cue(cue, exercise_id);
        }
    }
}

/// Cues for one batch of timer events. Catching up after a stall must not
/// stack chimes: an end cue swallows the batch's interval cues, and at most
/// one interval cue plays otherwise.
fn coalesce_cues(events: &[TimerEvent]) -> Vec<Cue> {
    let mut cues: Vec<Cue> = Vec::new();
    for cue in events.iter().filter_map(TimerEvent::cue) {
        if !cues.contains(&cue) {
            cues.push(cue);
        }
    }
    if cues.contains(&Cue::End) {
        cues.retain(|cue| *cue != Cue::Interval);
    }
    cues
}

#[cfg(test)]
mod tests {
    use super::{CatalogState, DeckSession};
    use crate::audio_cue::{
        AudioBackend, AudioContext, AudioCueEngine, AudioError, ContextState, Cue,
    };
    use crate::card_renderer::Card;
    use crate::catalog_loader::{parse_exercises, CatalogError};
    use crate::countdown_timer::TimerEvent;
    use crate::config::EngineConfig;
    use crate::models::{Category, TimerStatus};
    use crate::preference_store::PreferenceStore;
    use crate::tone_synth::Tone;
    use std::io;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const TRANSITION: Duration = Duration::from_millis(300);

    #[derive(Debug, Default)]
    struct SilentBackend;

    #[derive(Debug)]
    struct SilentContext;

    impl AudioBackend for SilentBackend {
        type Context = SilentContext;

        fn open_context(&mut self) -> Result<SilentContext, AudioError> {
            Ok(SilentContext)
        }
    }

    impl AudioContext for SilentContext {
        fn state(&self) -> ContextState {
            ContextState::Running
        }

        fn resume(&mut self) -> Result<(), AudioError> {
            Ok(())
        }

        fn play(&mut self, _tones: &[Tone]) -> Result<(), AudioError> {
            Ok(())
        }
    }

    const CATALOG: &str = r#"[
        {"id": 1, "name": "Bodyscan", "duration": "8 minuter", "instructions": "Ligg ner", "category": "Meditation"},
        {"id": 2, "name": "Fyrkantsandning", "duration": "4 minuter", "instructions": "Andas", "category": "Andning"},
        {"id": 3, "name": "Promenad", "duration": "10 minuter", "instructions": "Gå", "category": "Rörelse"},
        {"id": 4, "name": "Djupandning", "duration": "3 minuter", "instructions": "Andas djupt", "category": "Andning"}
    ]"#;

    fn session() -> (DeckSession<SilentBackend>, TempDir) {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut session = DeckSession::new(
            EngineConfig::default(),
            PreferenceStore::new(dir.path()),
            AudioCueEngine::new(SilentBackend),
        );
        session.load_catalog(parse_exercises(CATALOG));
        (session, dir)
    }

    fn advance(session: &mut DeckSession<SilentBackend>, now: &mut Instant) {
        assert!(session.go_next(*now));
        *now += TRANSITION;
        assert!(session.poll(*now).card_changed);
    }

    #[test]
    fn starts_on_cover_until_catalog_loads() {
        let dir = tempfile::tempdir().expect("temp dir");
        let session = DeckSession::new(
            EngineConfig::default(),
            PreferenceStore::new(dir.path()),
            AudioCueEngine::new(SilentBackend),
        );
        assert_eq!(session.catalog_state(), &CatalogState::Loading);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.deck.card_count, 1);
        assert!(matches!(snapshot.card, Card::Cover { .. }));
    }

    #[test]
    fn failed_load_degrades_to_cover_only() {
        let (mut session, _dir) = session();
        session.load_catalog(Err(CatalogError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "exercises.json",
        ))));
        assert_eq!(
            session.catalog_state(),
            &CatalogState::Failed("Kunde inte ladda övningarna".to_string())
        );
        assert_eq!(session.deck().card_count(), 1);
        assert!(!session.go_next(Instant::now()));
    }

    #[test]
    fn navigation_binds_timer_to_displayed_exercise() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        assert_eq!(session.timer().exercise_id(), None);
        advance(&mut session, &mut now);
        assert_eq!(session.timer().exercise_id(), Some(1));
        assert_eq!(session.timer().total_seconds(), 480);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.progress_current, 2);
        assert_eq!(snapshot.progress_total, 5);
    }

    #[test]
    fn changing_exercise_resets_running_timer() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        advance(&mut session, &mut now);
        session.toggle_play_pause(now);
        now += Duration::from_secs(45);
        session.poll(now);
        assert_eq!(session.timer().elapsed_seconds(), 45);

        advance(&mut session, &mut now);
        assert_eq!(session.timer().exercise_id(), Some(2));
        assert_eq!(session.timer().elapsed_seconds(), 0);
        assert_eq!(session.timer().status(), TimerStatus::Stopped);

        let later = session.poll(now + Duration::from_secs(30));
        assert!(later.timer_events.is_empty());
        assert_eq!(session.timer().elapsed_seconds(), 0);
    }

    #[test]
    fn cues_reach_the_engine() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        advance(&mut session, &mut now);
        session.toggle_play_pause(now);
        session.poll(now + Duration::from_secs(61));

        let cues: Vec<Cue> = session.cues().logs().iter().map(|record| record.cue).collect();
        assert_eq!(cues, vec![Cue::Start, Cue::Interval]);
        assert!(session
            .cues()
            .logs()
            .iter()
            .all(|record| record.exercise_id == Some(1)));
    }

    #[test]
    fn stalled_poll_plays_a_single_cue() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        advance(&mut session, &mut now);
        session.toggle_play_pause(now);

        let update = session.poll(now + Duration::from_secs(500));
        assert_eq!(session.timer().elapsed_seconds(), 480);
        assert_eq!(session.timer().status(), TimerStatus::Finished);
        assert!(update.timer_events.contains(&TimerEvent::Finished));
        let cues: Vec<Cue> = session.cues().logs().iter().map(|record| record.cue).collect();
        assert_eq!(cues, vec![Cue::Start, Cue::End]);
    }

    #[test]
    fn stalled_poll_chimes_once_while_running() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        advance(&mut session, &mut now);
        session.toggle_play_pause(now);

        session.poll(now + Duration::from_secs(185));
        let cues: Vec<Cue> = session.cues().logs().iter().map(|record| record.cue).collect();
        assert_eq!(cues, vec![Cue::Start, Cue::Interval]);
        assert_eq!(session.timer().last_chime_minute(), 3);
    }

    #[test]
    fn filter_shrink_clamps_index_and_rebinds_timer() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        for _ in 0..4 {
            advance(&mut session, &mut now);
        }
        assert_eq!(session.deck().visible_index(), 4);

        session.select_category(Some(Category::Breathing));
        assert_eq!(session.visible_exercises().len(), 2);
        assert_eq!(session.deck().visible_index(), 2);
        assert_eq!(session.timer().exercise_id(), Some(4));
    }

    #[test]
    fn favorites_only_turns_off_when_last_favorite_removed() {
        let (mut session, _dir) = session();
        session.toggle_favorite(3);
        assert!(session.toggle_favorites_only());
        assert_eq!(session.visible_exercises().len(), 1);

        assert!(!session.toggle_favorite(3));
        assert!(!session.filter().favorites_only);
        assert_eq!(session.visible_exercises().len(), 4);
    }

    #[test]
    fn favorites_only_without_favorites_stays_off() {
        let (mut session, _dir) = session();
        assert!(!session.toggle_favorites_only());
    }

    #[test]
    fn unmount_releases_input_and_cancels_tick() {
        let (mut session, _dir) = session();
        let mut now = Instant::now();
        advance(&mut session, &mut now);
        session.toggle_play_pause(now);
        session.unmount();

        assert!(!session.key_arrow_right(now));
        assert!(!session.timer().has_pending_tick());
        assert!(session.poll(now + Duration::from_secs(5)).is_empty());

        session.mount();
        assert_eq!(session.deck().visible_index(), 0);
        assert!(session.key_arrow_right(now));
    }

    #[test]
    fn completion_feeds_cover_card() {
        let (mut session, _dir) = session();
        assert!(session.toggle_completed(2));
        match session.current_card() {
            Card::Cover {
                completion_percent, ..
            } => assert_eq!(completion_percent, 25),
            other => panic!("unexpected card: {other:?}"),
        }
    }

    #[test]
    fn completion_never_counts_unknown_ids() {
        let (mut session, _dir) = session();
        for id in [1, 2, 50, 51, 52] {
            session.toggle_completed(id);
        }
        match session.current_card() {
            Card::Cover {
                completion_percent, ..
            } => assert_eq!(completion_percent, 50),
            other => panic!("unexpected card: {other:?}"),
        }
    }

    #[test]
    fn share_text_for_known_exercise() {
        let (session, _dir) = session();
        let text = session.share_text(2).expect("share text");
        assert!(text.starts_with("Fyrkantsandning"));
        assert!(session.share_text(99).is_none());
    }
}
