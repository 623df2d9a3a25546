//! The three rule engines: ordered food sequencing, dress choice, and the
//! ritual gate. They only touch session state; timers, animations and side
//! effects are driven by the caller from the returned outcome.

use tracing::info;

use crate::config::{AssetKey, ConfigStore};

use super::state::{FoodStage, SessionState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FoodPress {
    /// Correct next item; `completed` when the whole order is in.
    Accepted { completed: bool },
    /// Wrong item: the attempted sequence was cleared.
    Rejected { expected: String },
    /// Food is done or the feeding sub-phases own the page.
    Ignored,
}

/// Strict positional match against the configured order.
pub fn press_food(state: &mut SessionState, id: &str) -> FoodPress {
    if state.progress.food || state.gameplay.food_stage != FoodStage::Sequencing {
        return FoodPress::Ignored;
    }
    let order = &state.rules.correct_food_order;
    let step = state.gameplay.food_sequence.len();
    let Some(expected) = order.get(step) else {
        return FoodPress::Ignored;
    };
    if expected != id {
        let expected = expected.clone();
        info!(got = %id, expected = %expected, "wrong food item, sequence cleared");
        state.gameplay.food_sequence.clear();
        return FoodPress::Rejected { expected };
    }
    state.gameplay.food_sequence.push(id.to_string());
    if state.gameplay.food_sequence.len() == order.len() {
        info!("food order complete");
        state.progress.food = true;
        state.gameplay.food_sequence.clear();
        state.gameplay.food_stage = FoodStage::Baking;
        return FoodPress::Accepted { completed: true };
    }
    FoodPress::Accepted { completed: false }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DressChoice {
    Correct,
    Wrong,
}

/// Always recorded, right or wrong; the ritual gate checks correctness later.
pub fn choose_dress(state: &mut SessionState, config: &ConfigStore, id: &str) -> DressChoice {
    state.gameplay.chosen_dress = Some(id.to_string());
    state.progress.dress = true;
    state.gameplay.pet_image = config.asset(AssetKey::PetDress, &state.culture, Some(id));
    if state.dress_is_correct() {
        info!(dress = %id, "dress chosen");
        DressChoice::Correct
    } else {
        info!(dress = %id, correct = %state.rules.correct_dress_id, "wrong dress chosen");
        DressChoice::Wrong
    }
}

/// Reverts a dress choice. Ritual progress depends on the dress, so it goes too.
pub fn undress(state: &mut SessionState, config: &ConfigStore) -> bool {
    if state.gameplay.chosen_dress.is_none() {
        return false;
    }
    state.gameplay.chosen_dress = None;
    state.progress.dress = false;
    state.progress.ritual = false;
    state.gameplay.pet_image = config.asset(AssetKey::PetDefault, &state.culture, None);
    info!("pet undressed");
    true
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RitualAttempt {
    Started,
    /// Guard not met. The attempt has no effect at all.
    Refused,
}

pub fn attempt_ritual(state: &mut SessionState) -> RitualAttempt {
    if state.progress.ritual || state.is_animating() || !state.dress_is_correct() {
        return RitualAttempt::Refused;
    }
    state.progress.ritual = true;
    info!("ritual started");
    RitualAttempt::Started
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedingTap {
    Advanced(FoodStage),
    /// Baking or a feeding animation is still running.
    Busy,
    NotApplicable,
}

pub fn tap_feeding(state: &mut SessionState) -> FeedingTap {
    let stage = state.gameplay.food_stage;
    if !stage.is_exclusive() {
        return FeedingTap::NotApplicable;
    }
    match stage.on_tap() {
        Some(next) => {
            state.gameplay.food_stage = next;
            FeedingTap::Advanced(next)
        }
        None => FeedingTap::Busy,
    }
}
