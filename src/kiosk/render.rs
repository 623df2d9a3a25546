//! View derivation. `render` is a pure function of session state and
//! configuration; `diff` turns two consecutive views into the minimal list
//! of patches the DOM shell has to apply.

use crate::config::{AssetKey, ConfigStore, PageKind, TextKey};

use super::phase::{EndingStep, IntroStep, Phase};
use super::state::{FoodStage, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    /// Text and call-to-action area around the pet.
    Pet,
    /// Minigame buttons under the pet.
    Controls,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Minigame { page: PageKind, id: String },
    Ritual,
    EndingContinue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlButton {
    pub action: ButtonAction,
    pub asset: String,
    pub label: Option<String>,
    /// Single-button pages use a plain tap instead of drag-and-drop.
    pub draggable: bool,
    pub visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ZoneContent {
    #[default]
    Empty,
    Text(String),
    Button(ControlButton),
    Buttons(Vec<ControlButton>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub sleep_overlay: bool,
    pub pet_image: String,
    pub pet_zoomed: bool,
    pub progress_bar: String,
    pub pet_zone: ZoneContent,
    pub controls: ZoneContent,
    pub nav_left: bool,
    pub nav_right: bool,
    pub arrow_left: String,
    pub arrow_right: String,
}

impl View {
    pub fn zone(&self, zone: Zone) -> &ZoneContent {
        match zone {
            Zone::Pet => &self.pet_zone,
            Zone::Controls => &self.controls,
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut ZoneContent {
        match zone {
            Zone::Pet => &mut self.pet_zone,
            Zone::Controls => &mut self.controls,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    SleepOverlay(bool),
    PetImage(String),
    PetZoom(bool),
    ProgressBar(String),
    Zone(Zone, ZoneContent),
    NavLeft(bool),
    NavRight(bool),
    Arrows { left: String, right: String },
}

pub fn render(state: &SessionState, config: &ConfigStore) -> View {
    let (nav_left, nav_right) = nav_visibility(state, config);
    View {
        sleep_overlay: state.phase == Phase::Asleep,
        pet_image: pet_image(state, config),
        pet_zoomed: state.phase.is_zoomed(),
        progress_bar: progress_bar(state, config),
        pet_zone: zone_content(Zone::Pet, state, config),
        controls: zone_content(Zone::Controls, state, config),
        nav_left,
        nav_right,
        arrow_left: config.asset(AssetKey::ArrowLeft, &state.culture, None),
        arrow_right: config.asset(AssetKey::ArrowRight, &state.culture, None),
    }
}

pub fn diff(prev: Option<&View>, next: &View) -> Vec<Patch> {
    let mut patches = Vec::new();
    let changed = |f: &dyn Fn(&View) -> bool| prev.is_none_or(|p| !f(p));
    if changed(&|p| p.sleep_overlay == next.sleep_overlay) {
        patches.push(Patch::SleepOverlay(next.sleep_overlay));
    }
    if changed(&|p| p.pet_image == next.pet_image) {
        patches.push(Patch::PetImage(next.pet_image.clone()));
    }
    if changed(&|p| p.pet_zoomed == next.pet_zoomed) {
        patches.push(Patch::PetZoom(next.pet_zoomed));
    }
    if changed(&|p| p.progress_bar == next.progress_bar) {
        patches.push(Patch::ProgressBar(next.progress_bar.clone()));
    }
    for zone in [Zone::Pet, Zone::Controls] {
        if changed(&|p| p.zone(zone) == next.zone(zone)) {
            patches.push(Patch::Zone(zone, next.zone(zone).clone()));
        }
    }
    if changed(&|p| p.nav_left == next.nav_left) {
        patches.push(Patch::NavLeft(next.nav_left));
    }
    if changed(&|p| p.nav_right == next.nav_right) {
        patches.push(Patch::NavRight(next.nav_right));
    }
    if changed(&|p| p.arrow_left == next.arrow_left && p.arrow_right == next.arrow_right) {
        patches.push(Patch::Arrows { left: next.arrow_left.clone(), right: next.arrow_right.clone() });
    }
    patches
}

/// Drops `zone` changes from `patches` and keeps the previous content in
/// `next`, so a later diff still reports it. Used while an element of that
/// zone floats, since rebuilding the zone would detach it. Returns whether
/// anything was held.
pub fn hold_zone(patches: &mut Vec<Patch>, next: &mut View, prev: Option<&View>, zone: Zone) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    let before = patches.len();
    patches.retain(|p| !matches!(p, Patch::Zone(z, _) if *z == zone));
    if patches.len() == before {
        return false;
    }
    *next.zone_mut(zone) = prev.zone(zone).clone();
    true
}

/// Arrow visibility; also the rule navigation itself obeys.
pub fn nav_visibility(state: &SessionState, config: &ConfigStore) -> (bool, bool) {
    if state.phase != Phase::Gameplay {
        return (false, false);
    }
    let idx = state.page_index;
    let on_food = config.pages().get(idx).map(|p| p.kind) == Some(PageKind::Food);
    if on_food && state.gameplay.food_stage.is_exclusive() {
        return (false, false);
    }
    let count = config.pages().len();
    let left = idx > 0;
    let right = idx + 1 < count
        && (!config.base().gated_navigation || state.unlocked.get(idx + 1).copied().unwrap_or(false));
    (left, right)
}

/// Pixel offset of button `index` of `count` on the upper half-arc, relative
/// to the arc center, and the button edge length.
pub fn button_arc_position(index: usize, count: usize, radius: f64) -> (f64, f64, f64) {
    let size = 40.0 + 40.0 / count.max(1) as f64;
    let step = 180.0 / (count + 1) as f64;
    let angle = (180.0 - (index + 1) as f64 * step).to_radians();
    (radius * angle.cos(), radius * angle.sin(), size)
}

fn current_page(state: &SessionState, config: &ConfigStore) -> Option<PageKind> {
    config.pages().get(state.page_index).map(|p| p.kind)
}

fn pet_image(state: &SessionState, config: &ConfigStore) -> String {
    if let Some(playing) = &state.ui.playing {
        return playing.path.clone();
    }
    let culture = &state.culture;
    match state.phase {
        Phase::Intro(IntroStep::StaticImage) => return config.asset(AssetKey::IntroStatic, culture, None),
        Phase::Intro(IntroStep::Greeting) => return config.asset(AssetKey::IntroGreeting, culture, None),
        _ => {}
    }
    if state.phase == Phase::Gameplay && current_page(state, config) == Some(PageKind::Food) {
        match state.gameplay.food_stage {
            FoodStage::Sequencing if !state.progress.food => {
                let count = state.gameplay.food_sequence.len().to_string();
                return config.asset(AssetKey::Bowl, culture, Some(&count));
            }
            FoodStage::Baked
            | FoodStage::ReadyToEat
            | FoodStage::Eating { .. }
            | FoodStage::Sharing { .. } => return config.asset(AssetKey::PetBaked, culture, None),
            _ => {}
        }
    }
    state.gameplay.pet_image.clone()
}

fn progress_bar(state: &SessionState, config: &ConfigStore) -> String {
    let score = state.progress.score().to_string();
    let key = if state.ui.progress_flash { AssetKey::ProgressUp } else { AssetKey::Progress };
    config.asset(key, &state.culture, Some(&score))
}

fn zone_content(zone: Zone, state: &SessionState, config: &ConfigStore) -> ZoneContent {
    state
        .ui
        .messages
        .get(&zone)
        .cloned()
        .or_else(|| phase_content(zone, state, config))
        .or_else(|| gameplay_content(zone, state, config))
        .unwrap_or_default()
}

fn phase_content(zone: Zone, state: &SessionState, config: &ConfigStore) -> Option<ZoneContent> {
    let culture = &state.culture;
    let text = |key| ZoneContent::Text(config.text(key, culture));
    if state.phase == Phase::Gameplay {
        return None;
    }
    if zone == Zone::Controls {
        return Some(ZoneContent::Empty);
    }
    Some(match state.phase {
        Phase::AwakeIdle => text(TextKey::TapToStart),
        Phase::Intro(IntroStep::Welcome) => text(TextKey::Welcome),
        Phase::Intro(IntroStep::Instructions) => text(TextKey::Instructions),
        Phase::Ending(EndingStep::ButtonWait) => ZoneContent::Button(ControlButton {
            action: ButtonAction::EndingContinue,
            asset: config.asset(AssetKey::EndingButton, culture, None),
            label: Some(config.text(TextKey::EndingCall, culture)),
            draggable: false,
            visible: true,
        }),
        Phase::Ending(EndingStep::ZoomedMessages { index }) => {
            ZoneContent::Text(config.ending_message(index, culture).unwrap_or_default())
        }
        Phase::Ending(EndingStep::Goodbye) => text(TextKey::Goodbye),
        _ => ZoneContent::Empty,
    })
}

fn gameplay_content(zone: Zone, state: &SessionState, config: &ConfigStore) -> Option<ZoneContent> {
    if state.is_animating() {
        return None;
    }
    let page = current_page(state, config)?;
    let culture = &state.culture;
    match zone {
        Zone::Pet => {
            let ritual_page = config.page_index(PageKind::Ritual).or_else(|| config.page_index(PageKind::Dress));
            if ritual_page == Some(state.page_index) && state.dress_is_correct() && !state.progress.ritual {
                return Some(ZoneContent::Button(ControlButton {
                    action: ButtonAction::Ritual,
                    asset: config.asset(AssetKey::RitualButton, culture, None),
                    label: None,
                    draggable: false,
                    visible: true,
                }));
            }
            let key = match (page, state.gameplay.food_stage) {
                (PageKind::Ritual, _) if !state.progress.ritual => TextKey::RitualNeedsDress,
                (PageKind::Food, FoodStage::Baked) => TextKey::TapToServe,
                (PageKind::Food, FoodStage::ReadyToEat) => TextKey::TapToEat,
                (PageKind::Food, FoodStage::Eating { settled: true }) => TextKey::TapToShare,
                (PageKind::Food, FoodStage::Sharing { settled: true }) => TextKey::TapToFinish,
                _ => return None,
            };
            Some(ZoneContent::Text(config.text(key, culture)))
        }
        Zone::Controls => {
            let show = match page {
                PageKind::Food => state.gameplay.food_stage == FoodStage::Sequencing && !state.progress.food,
                PageKind::Dress => !state.progress.ritual,
                PageKind::Home | PageKind::Ritual => false,
            };
            if !show {
                return None;
            }
            let ids = &config.pages()[state.page_index].buttons;
            if ids.is_empty() {
                return None;
            }
            let buttons = ids
                .iter()
                .map(|id| ControlButton {
                    action: ButtonAction::Minigame { page, id: id.clone() },
                    asset: config.button_asset(culture, page, id),
                    label: None,
                    draggable: ids.len() > 1,
                    visible: match page {
                        PageKind::Food => !state.gameplay.food_sequence.contains(id),
                        PageKind::Dress => state.gameplay.chosen_dress.as_deref() != Some(id.as_str()),
                        _ => true,
                    },
                })
                .collect();
            Some(ZoneContent::Buttons(buttons))
        }
    }
}
