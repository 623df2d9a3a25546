//! Session state: the single mutable record the kiosk derives everything from.

use std::collections::BTreeMap;

use crate::config::{AssetKey, CueKey, Rules};

use super::phase::Phase;
use super::render::{Zone, ZoneContent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub food: bool,
    pub dress: bool,
    pub ritual: bool,
}

impl Progress {
    pub fn score(&self) -> u8 {
        self.food as u8 + self.dress as u8 + self.ritual as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakingState {
    None,
    Baking,
    Baked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedingState {
    Idle,
    ReadyToEat,
    Eating,
    Sharing,
    Done,
}

/// Food minigame sub-phase. `settled` marks that the timed eating / sharing
/// animation has finished and the next tap may be accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoodStage {
    Sequencing,
    Baking,
    Baked,
    ReadyToEat,
    Eating { settled: bool },
    Sharing { settled: bool },
    Done,
}

impl FoodStage {
    pub fn on_tap(self) -> Option<FoodStage> {
        match self {
            FoodStage::Baked => Some(FoodStage::ReadyToEat),
            FoodStage::ReadyToEat => Some(FoodStage::Eating { settled: false }),
            FoodStage::Eating { settled: true } => Some(FoodStage::Sharing { settled: false }),
            FoodStage::Sharing { settled: true } => Some(FoodStage::Done),
            _ => None,
        }
    }

    pub fn on_animation_end(self) -> Option<FoodStage> {
        match self {
            FoodStage::Baking => Some(FoodStage::Baked),
            FoodStage::Eating { settled: false } => Some(FoodStage::Eating { settled: true }),
            FoodStage::Sharing { settled: false } => Some(FoodStage::Sharing { settled: true }),
            _ => None,
        }
    }

    /// Between baking start and `Done` the food page owns the screen.
    pub fn is_exclusive(self) -> bool {
        !matches!(self, FoodStage::Sequencing | FoodStage::Done)
    }

    pub fn baking_state(self) -> BakingState {
        match self {
            FoodStage::Sequencing => BakingState::None,
            FoodStage::Baking => BakingState::Baking,
            _ => BakingState::Baked,
        }
    }

    pub fn feeding_state(self) -> FeedingState {
        match self {
            FoodStage::Sequencing | FoodStage::Baking | FoodStage::Baked => FeedingState::Idle,
            FoodStage::ReadyToEat => FeedingState::ReadyToEat,
            FoodStage::Eating { .. } => FeedingState::Eating,
            FoodStage::Sharing { .. } => FeedingState::Sharing,
            FoodStage::Done => FeedingState::Done,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationKind {
    Baking,
    Eating,
    Sharing,
    Ritual,
    Goodbye,
}

impl AnimationKind {
    pub fn asset(self) -> AssetKey {
        match self {
            AnimationKind::Baking => AssetKey::PetBaking,
            AnimationKind::Eating => AssetKey::PetEating,
            AnimationKind::Sharing => AssetKey::PetSharing,
            AnimationKind::Ritual => AssetKey::PetRitual,
            AnimationKind::Goodbye => AssetKey::PetGoodbye,
        }
    }

    pub fn cue(self) -> CueKey {
        match self {
            AnimationKind::Baking => CueKey::Baking,
            AnimationKind::Eating => CueKey::Eating,
            AnimationKind::Sharing => CueKey::Sharing,
            AnimationKind::Ritual => CueKey::Ritual,
            AnimationKind::Goodbye => CueKey::Goodbye,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayingAnimation {
    pub kind: AnimationKind,
    pub path: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameplayState {
    /// Correct presses so far; never longer than the configured order.
    pub food_sequence: Vec<String>,
    pub food_stage: FoodStage,
    pub chosen_dress: Option<String>,
    /// Resolved default or dressed pet image.
    pub pet_image: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    /// Celebratory animation in flight; image reconciliation leaves it alone.
    pub playing: Option<PlayingAnimation>,
    pub messages: BTreeMap<Zone, ZoneContent>,
    pub last_score: u8,
    pub progress_flash: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub culture: String,
    pub rules: Rules,
    pub page_index: usize,
    pub progress: Progress,
    pub unlocked: Vec<bool>,
    pub gameplay: GameplayState,
    pub ui: UiState,
    pub token: u64,
}

impl SessionState {
    pub fn new(culture: String, rules: Rules, pet_image: String, page_count: usize, token: u64) -> Self {
        let mut unlocked = vec![false; page_count];
        if let Some(first) = unlocked.first_mut() {
            *first = true;
        }
        Self {
            phase: Phase::Asleep,
            culture,
            rules,
            page_index: 0,
            progress: Progress::default(),
            unlocked,
            gameplay: GameplayState {
                food_sequence: Vec::new(),
                food_stage: FoodStage::Sequencing,
                chosen_dress: None,
                pet_image,
            },
            ui: UiState::default(),
            token,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.ui.playing.is_some()
    }

    pub fn dress_is_correct(&self) -> bool {
        self.gameplay.chosen_dress.as_deref() == Some(self.rules.correct_dress_id.as_str())
    }

    pub fn baking_state(&self) -> BakingState {
        self.gameplay.food_stage.baking_state()
    }

    pub fn feeding_state(&self) -> FeedingState {
        self.gameplay.food_stage.feeding_state()
    }
}
