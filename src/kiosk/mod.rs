//! Kiosk controller: owns the session state and funnels every input, timer
//! and drag completion through named transitions.
//!
//! Everything runs on one thread. The shell feeds inputs and a monotonic
//! clock (`tick`), then asks for a fresh `View` when `take_dirty` says so and
//! drains side effects (hardware pings, audio cues) from the outbox.

pub mod drag;
pub mod gesture;
pub mod minigames;
pub mod phase;
pub mod render;
pub mod state;
pub mod timers;

use tracing::{debug, info, trace, warn};

use crate::config::{AssetKey, ConfigStore, CueKey, PageKind, TextKey};

use drag::{DragOutcome, DragSession, DragTarget, DropZone, Point, Rect, SnapBack};
use gesture::{Direction, MotionSample};
use minigames::{DressChoice, FeedingTap, FoodPress, RitualAttempt};
use phase::{EndingStep, IntroStep, Phase, PhaseEvent};
use render::{View, Zone, ZoneContent};
use state::{AnimationKind, FoodStage, PlayingAnimation, SessionState};
use timers::{Scheduler, TimerAction, TimerSlot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyReason {
    WrongFood,
    WrongDress,
    Ritual,
    StartupAnimation,
    FoodSharing,
}

/// Fire-and-forget side effects for the shell to carry out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    NotifyHardware(NotifyReason),
    PlayCue { cue: CueKey, path: String },
}

/// Screen geometry the drop zones are computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Geometry {
    pub viewport: Rect,
    pub pet_zone: Rect,
}

pub struct Kiosk {
    config: ConfigStore,
    state: SessionState,
    timers: Scheduler,
    drag: Option<DragSession>,
    snap_backs: Vec<SnapBack>,
    geometry: Geometry,
    effects: Vec<Effect>,
    now_ms: f64,
    dirty: bool,
}

impl Kiosk {
    pub fn new(config: ConfigStore, culture: Option<&str>) -> Self {
        let state = fresh_state(&config, culture, 1);
        let mut kiosk = Self {
            config,
            state,
            timers: Scheduler::new(),
            drag: None,
            snap_backs: Vec::new(),
            geometry: Geometry::default(),
            effects: Vec::new(),
            now_ms: 0.0,
            dirty: true,
        };
        kiosk.changed();
        info!(culture = %kiosk.state.culture, "kiosk ready");
        kiosk
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    pub fn render(&self) -> View {
        render::render(&self.state, &self.config)
    }

    /// True once after any state mutation since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.timers.is_scheduled(slot)
    }

    pub fn deadline(&self, slot: TimerSlot) -> Option<f64> {
        self.timers.due_at(slot)
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    /// Rebuilds the whole session: culture re-rolled (or forced), progress
    /// and minigames cleared, every timer cancelled, token advanced.
    pub fn reset_game(&mut self, culture: Option<&str>) {
        let cancelled = self.timers.cancel_all();
        self.drag = None;
        self.snap_backs.clear();
        self.state = fresh_state(&self.config, culture, self.state.token + 1);
        self.changed();
        info!(culture = %self.state.culture, token = self.state.token, cancelled, "game reset");
    }

    /// Advances the virtual clock and runs every task due by `now_ms`, in due
    /// order. Follow-up tasks are scheduled relative to their parent's due
    /// time so long jumps replay whole chains.
    pub fn tick(&mut self, now_ms: f64) {
        let target = self.now_ms.max(now_ms);
        while let Some((slot, task)) = self.timers.pop_due(target) {
            if task.token != self.state.token {
                trace!(?slot, "dropping stale timer");
                continue;
            }
            self.now_ms = self.now_ms.max(task.due_ms);
            self.fire(task.action);
        }
        self.now_ms = target;
        self.snap_backs.retain(|s| !s.is_finished(target));
    }

    // --- inputs -------------------------------------------------------------

    pub fn wake(&mut self) -> bool {
        self.apply(PhaseEvent::Wake)
    }

    pub fn shake(&mut self, sample: &MotionSample) -> bool {
        gesture::is_shake(sample, self.config.timings().shake_threshold) && self.wake()
    }

    /// Keyboard fallback: wake key, and a reset key forcing the debug culture.
    pub fn key(&mut self, key: &str) -> bool {
        let debug = &self.config.base().debug;
        if key.eq_ignore_ascii_case(&debug.wake_key) {
            self.wake()
        } else if key.eq_ignore_ascii_case(&debug.reset_key) {
            let culture = debug.culture.clone();
            self.reset_game(Some(&culture));
            true
        } else {
            false
        }
    }

    /// Generic activate input: starts the intro while idle, drives the
    /// feeding sub-phases during gameplay.
    pub fn tap(&mut self) -> bool {
        match self.state.phase {
            Phase::AwakeIdle => {
                self.touch();
                self.apply(PhaseEvent::Activate)
            }
            Phase::Gameplay => {
                self.touch();
                if self.current_page() != Some(PageKind::Food) {
                    return false;
                }
                match minigames::tap_feeding(&mut self.state) {
                    FeedingTap::Advanced(stage) => {
                        self.feeding_advanced(stage);
                        true
                    }
                    FeedingTap::Busy | FeedingTap::NotApplicable => false,
                }
            }
            _ => false,
        }
    }

    /// Pointer released on the main surface: a swipe if it travelled far
    /// enough horizontally, a tap otherwise.
    pub fn surface_release(&mut self, start_x: f64, end_x: f64) -> bool {
        match gesture::swipe_direction(start_x, end_x, self.config.timings().swipe_threshold) {
            Some(direction) => self.navigate(direction),
            None => self.tap(),
        }
    }

    pub fn navigate(&mut self, direction: Direction) -> bool {
        if self.state.phase != Phase::Gameplay || self.drag.is_some() {
            return false;
        }
        self.touch();
        let (left, right) = render::nav_visibility(&self.state, &self.config);
        let allowed = match direction {
            Direction::Prev => left,
            Direction::Next => right,
        };
        if !allowed {
            return false;
        }
        let next = gesture::step_page(self.state.page_index, self.config.pages().len(), direction);
        if next == self.state.page_index {
            return false;
        }
        debug!(from = self.state.page_index, to = next, "page change");
        self.state.page_index = next;
        self.changed();
        true
    }

    /// Minigame button accepted on the pet. Returns whether the press was
    /// accepted (a rejected drag snaps back).
    pub fn press_button(&mut self, page: PageKind, id: &str) -> bool {
        if self.state.phase != Phase::Gameplay || self.current_page() != Some(page) {
            return false;
        }
        self.touch();
        match page {
            PageKind::Food => match minigames::press_food(&mut self.state, id) {
                FoodPress::Accepted { completed } => {
                    self.cue(CueKey::Correct);
                    if completed {
                        debug!(baking = ?self.state.baking_state(), "oven on");
                        let ms = self.config.timings().baking_ms;
                        self.play_animation(AnimationKind::Baking, ms);
                    }
                    self.changed();
                    true
                }
                FoodPress::Rejected { .. } => {
                    self.notify(NotifyReason::WrongFood);
                    self.cue(CueKey::Wrong);
                    self.hint(TextKey::WrongFood);
                    self.changed();
                    false
                }
                FoodPress::Ignored => false,
            },
            PageKind::Dress => {
                match minigames::choose_dress(&mut self.state, &self.config, id) {
                    DressChoice::Correct => self.cue(CueKey::Correct),
                    DressChoice::Wrong => {
                        self.notify(NotifyReason::WrongDress);
                        self.cue(CueKey::Wrong);
                        self.hint(TextKey::WrongDress);
                    }
                }
                self.changed();
                true
            }
            PageKind::Ritual => self.trigger_ritual(),
            PageKind::Home => false,
        }
    }

    pub fn trigger_ritual(&mut self) -> bool {
        if self.state.phase != Phase::Gameplay {
            return false;
        }
        self.touch();
        match minigames::attempt_ritual(&mut self.state) {
            RitualAttempt::Started => {
                self.notify(NotifyReason::Ritual);
                let ms = self.config.timings().ritual_ms;
                self.play_animation(AnimationKind::Ritual, ms);
                self.changed();
                true
            }
            RitualAttempt::Refused => false,
        }
    }

    pub fn press_ending_button(&mut self) -> bool {
        self.apply(PhaseEvent::Continue)
    }

    /// Temporary zone content, cleared by its own timer.
    pub fn show_message(&mut self, zone: Zone, content: ZoneContent, duration_ms: f64) {
        self.state.ui.messages.insert(zone, content);
        let due = self.now_ms + duration_ms;
        self.timers.schedule(TimerSlot::Message(zone), due, self.state.token, TimerAction::ClearMessage(zone));
        self.dirty = true;
    }

    // --- drag and drop ------------------------------------------------------

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a drag session; only one may exist at a time.
    pub fn begin_drag(&mut self, target: DragTarget, element: Rect, pointer: Point) -> bool {
        if self.drag.is_some() || self.state.phase != Phase::Gameplay || self.state.is_animating() {
            return false;
        }
        match &target {
            DragTarget::Pet => {
                let inner = element.inner(self.config.layout().undress_inner_ratio);
                if self.state.gameplay.chosen_dress.is_none() || !inner.contains(pointer) {
                    return false;
                }
            }
            DragTarget::Button { page, .. } => {
                if self.current_page() != Some(*page) {
                    return false;
                }
            }
        }
        self.touch();
        self.snap_backs.retain(|s| s.target != target);
        self.drag = Some(DragSession::begin(target, element, pointer));
        true
    }

    pub fn move_drag(&mut self, pointer: Point) -> Option<Rect> {
        self.drag.as_mut().map(|s| s.move_to(pointer))
    }

    /// Ends the drag at `pointer`. The drag slot is free again before this
    /// returns, whatever the acceptance callback did.
    pub fn end_drag(&mut self, pointer: Point) -> Option<DragOutcome> {
        let mut session = self.drag.take()?;
        session.move_to(pointer);
        let zone = self.drop_zone(&session.target);
        let (now, snap_ms) = (self.now_ms, self.config.timings().snap_back_ms);
        let outcome = session.release(&zone, now, snap_ms, |target| match target {
            DragTarget::Button { page, id } => self.press_button(*page, id),
            DragTarget::Pet => self.undress(),
        });
        if let DragOutcome::Rejected(snap) = &outcome {
            self.snap_backs.push(snap.clone());
        }
        Some(outcome)
    }

    /// Pointer lost mid-drag (window blur, touch cancel): always a snap-back.
    pub fn cancel_drag(&mut self) {
        if let Some(session) = self.drag.take() {
            let snap_ms = self.config.timings().snap_back_ms;
            if let DragOutcome::Rejected(snap) = session.release(&self.drop_zone(&DragTarget::Pet), self.now_ms, snap_ms, |_| false) {
                self.snap_backs.push(snap);
            }
        }
    }

    /// Free-floating position of an element, while dragged or snapping back.
    pub fn floating_rect(&self, target: &DragTarget) -> Option<Rect> {
        if let Some(session) = self.drag.as_ref().filter(|s| &s.target == target) {
            return Some(session.current);
        }
        self.snap_backs
            .iter()
            .find(|s| &s.target == target)
            .map(|s| s.position_at(self.now_ms))
    }

    // --- internals ----------------------------------------------------------

    fn undress(&mut self) -> bool {
        if minigames::undress(&mut self.state, &self.config) {
            self.changed();
            true
        } else {
            false
        }
    }

    fn drop_zone(&self, target: &DragTarget) -> DropZone {
        let layout = self.config.layout();
        match target {
            DragTarget::Button { .. } => DropZone::Overlap {
                target: self.geometry.pet_zone,
                min_ratio: layout.drop_min_overlap,
            },
            DragTarget::Pet => DropZone::OutsideRadius {
                center: self.geometry.viewport.center(),
                min_distance: layout.undress_radius,
            },
        }
    }

    fn current_page(&self) -> Option<PageKind> {
        self.config.pages().get(self.state.page_index).map(|p| p.kind)
    }

    fn fire(&mut self, action: TimerAction) {
        match action {
            TimerAction::FallAsleep => {
                // Sleep keeps the session: progress, dress and culture survive
                // until the next reset.
                if self.apply(PhaseEvent::Sleep) {
                    self.cancel_drag();
                    info!(culture = %self.state.culture, score = self.state.progress.score(), "inactivity timeout, pet asleep");
                }
            }
            TimerAction::AdvanceSequence => {
                self.apply(PhaseEvent::StepElapsed);
            }
            TimerAction::FinishAnimation => self.finish_animation(),
            TimerAction::SettleProgress => {
                self.state.ui.progress_flash = false;
                self.dirty = true;
            }
            TimerAction::ClearMessage(zone) => {
                self.state.ui.messages.remove(&zone);
                self.dirty = true;
            }
        }
    }

    /// Runs `event` through the phase table; illegal events are no-ops.
    fn apply(&mut self, event: PhaseEvent) -> bool {
        let messages = self.config.base().ending_messages.len();
        let Some(next) = self.state.phase.on(event, messages) else {
            trace!(phase = ?self.state.phase, ?event, "input ignored in this phase");
            return false;
        };
        debug!(from = ?self.state.phase, to = ?next, "phase transition");
        self.state.phase = next;
        self.enter(next);
        self.changed();
        true
    }

    fn enter(&mut self, phase: Phase) {
        let timings = self.config.timings().clone();
        match phase {
            Phase::Asleep => {
                self.timers.cancel(TimerSlot::Inactivity);
                self.timers.cancel(TimerSlot::Sequence);
            }
            Phase::AwakeIdle => {
                self.restart_inactivity();
                self.cue(CueKey::Wake);
            }
            Phase::Intro(step) => {
                let hold = match step {
                    IntroStep::StaticImage => timings.intro_static_ms,
                    IntroStep::Greeting => {
                        self.notify(NotifyReason::StartupAnimation);
                        timings.intro_greeting_ms
                    }
                    IntroStep::Welcome => timings.intro_welcome_ms,
                    IntroStep::Instructions => timings.intro_instructions_ms,
                };
                self.schedule(TimerSlot::Sequence, hold, TimerAction::AdvanceSequence);
            }
            Phase::Gameplay => {
                self.state.page_index = 0;
                self.restart_inactivity();
            }
            Phase::Ending(EndingStep::ButtonWait) => {
                self.timers.cancel(TimerSlot::Inactivity);
            }
            Phase::Ending(EndingStep::ZoomedMessages { .. }) => {
                self.schedule(TimerSlot::Sequence, timings.ending_message_ms, TimerAction::AdvanceSequence);
            }
            Phase::Ending(EndingStep::Goodbye) => {
                self.play_animation(AnimationKind::Goodbye, timings.goodbye_ms);
            }
        }
    }

    fn play_animation(&mut self, kind: AnimationKind, duration_ms: f64) {
        let path = self.config.asset(kind.asset(), &self.state.culture, None);
        debug!(?kind, %path, "animation start");
        self.state.ui.playing = Some(PlayingAnimation { kind, path });
        self.schedule(TimerSlot::Animation, duration_ms, TimerAction::FinishAnimation);
        self.cue(kind.cue());
        self.dirty = true;
    }

    fn finish_animation(&mut self) {
        let Some(playing) = self.state.ui.playing.take() else {
            return;
        };
        debug!(kind = ?playing.kind, "animation end");
        match playing.kind {
            AnimationKind::Baking | AnimationKind::Eating | AnimationKind::Sharing => {
                if let Some(next) = self.state.gameplay.food_stage.on_animation_end() {
                    self.state.gameplay.food_stage = next;
                }
            }
            AnimationKind::Ritual => {
                self.apply(PhaseEvent::RitualComplete);
            }
            AnimationKind::Goodbye => {}
        }
        self.changed();
    }

    fn feeding_advanced(&mut self, stage: FoodStage) {
        debug!(feeding = ?self.state.feeding_state(), "feeding advanced");
        let timings = self.config.timings().clone();
        match stage {
            FoodStage::Eating { settled: false } => self.play_animation(AnimationKind::Eating, timings.eating_ms),
            FoodStage::Sharing { settled: false } => {
                self.notify(NotifyReason::FoodSharing);
                self.play_animation(AnimationKind::Sharing, timings.sharing_ms);
            }
            FoodStage::Done => info!("feeding done"),
            _ => self.cue(CueKey::Correct),
        }
        self.changed();
    }

    fn hint(&mut self, key: TextKey) {
        let text = self.config.text(key, &self.state.culture);
        if text.is_empty() {
            return;
        }
        let ms = self.config.timings().message_ms;
        self.show_message(Zone::Pet, ZoneContent::Text(text), ms);
    }

    /// Qualifying input while awake pushes the inactivity deadline back.
    fn touch(&mut self) {
        if self.state.phase.is_awake() {
            self.restart_inactivity();
        }
    }

    fn restart_inactivity(&mut self) {
        let ms = self.config.timings().inactivity_ms;
        self.schedule(TimerSlot::Inactivity, ms, TimerAction::FallAsleep);
    }

    fn schedule(&mut self, slot: TimerSlot, after_ms: f64, action: TimerAction) {
        self.timers.schedule(slot, self.now_ms + after_ms, self.state.token, action);
    }

    /// Bookkeeping after every mutation: progress flash, page unlocks, redraw.
    fn changed(&mut self) {
        let score = self.state.progress.score();
        if score > self.state.ui.last_score {
            self.state.ui.progress_flash = true;
            let ms = self.config.timings().progress_flash_ms;
            self.schedule(TimerSlot::ProgressFlash, ms, TimerAction::SettleProgress);
            self.cue(CueKey::Progress);
        }
        self.state.ui.last_score = score;

        let pages = self.config.pages();
        for i in 1..pages.len() {
            let done = match pages[i - 1].kind {
                PageKind::Home => true,
                PageKind::Food => self.state.gameplay.food_stage == FoodStage::Done,
                PageKind::Dress => self.state.progress.dress,
                PageKind::Ritual => self.state.progress.ritual,
            };
            if done && !self.state.unlocked[i] {
                debug!(page = pages[i].kind.as_str(), "page unlocked");
                self.state.unlocked[i] = true;
            }
        }
        self.dirty = true;
    }

    fn notify(&mut self, reason: NotifyReason) {
        self.effects.push(Effect::NotifyHardware(reason));
    }

    fn cue(&mut self, cue: CueKey) {
        if let Some(path) = self.config.cue(cue) {
            let path = path.to_string();
            self.effects.push(Effect::PlayCue { cue, path });
        }
    }
}

fn fresh_state(config: &ConfigStore, culture: Option<&str>, token: u64) -> SessionState {
    let culture = match culture.filter(|c| config.is_culture(c)) {
        Some(c) => c.to_string(),
        None => {
            if let Some(requested) = culture {
                warn!(culture = %requested, "unknown culture requested, rolling one");
            }
            let cultures = config.cultures();
            cultures[random_index(cultures.len())].clone()
        }
    };
    let rules = config.rules_for(&culture);
    let pet = config.asset(AssetKey::PetDefault, &culture, None);
    SessionState::new(culture, rules, pet, config.pages().len(), token)
}

fn random_index(len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => (u64::from_le_bytes(buf) % len as u64) as usize,
        Err(err) => {
            warn!(%err, "no randomness available, using the first culture");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kiosk() -> Kiosk {
        let cfg = ConfigStore::from_json(
            r#"{
                "rules": { "correct_food_order": ["2","1","4","3"], "correct_dress_id": "1" },
                "assets": { "pet_default": "{culture}/pet.png" },
                "cultures": ["kurd", "maori"]
            }"#,
            "{}",
        )
        .unwrap();
        Kiosk::new(cfg, Some("kurd"))
    }

    #[test]
    fn stale_token_tasks_never_fire() {
        let mut k = kiosk();
        k.wake();
        let old = k.state.token;
        k.timers.schedule(TimerSlot::Sequence, 10.0, old - 1, TimerAction::AdvanceSequence);
        k.tick(20.0);
        assert_eq!(k.state.phase, Phase::AwakeIdle);
    }

    #[test]
    fn reset_advances_token_and_clears_timers() {
        let mut k = kiosk();
        k.wake();
        k.tap();
        assert!(k.timers.len() >= 2);
        let before = k.state.token;
        k.reset_game(Some("maori"));
        assert_eq!(k.state.token, before + 1);
        assert!(k.timers.is_empty());
        assert_eq!(k.state.culture, "maori");
        assert_eq!(k.state.phase, Phase::Asleep);
    }

    #[test]
    fn unknown_forced_culture_falls_back_to_a_configured_one() {
        let mut k = kiosk();
        k.reset_game(Some("atlantis"));
        assert!(k.config.is_culture(&k.state.culture));
    }

    #[test]
    fn home_page_unlocks_food_immediately() {
        let k = kiosk();
        assert_eq!(k.state.unlocked, vec![true, true, false, false]);
    }
}
