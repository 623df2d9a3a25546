//! Configuration store: the base ruleset / asset templates / layout document
//! plus the per-culture override map, both loaded once at startup.
//!
//! Templates use `{culture}` and `{id}` placeholders for assets and
//! `{name}` placeholders (culture variables, plus `culture`) for texts.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, Document};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rules {
    pub correct_food_order: Vec<String>,
    pub correct_dress_id: String,
}

/// Partial rules from `cultures.json`; absent fields keep the base value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleOverrides {
    pub correct_food_order: Option<Vec<String>>,
    pub correct_dress_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CultureOverride {
    pub rules: RuleOverrides,
    pub variables: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKey {
    PetDefault,
    /// `{id}` = dress identifier.
    PetDress,
    IntroStatic,
    IntroGreeting,
    /// `{id}` = number of correct food presses so far.
    Bowl,
    PetBaking,
    PetBaked,
    PetEating,
    PetSharing,
    PetRitual,
    PetGoodbye,
    /// `{id}` = progress score 0..=3.
    Progress,
    /// `{id}` = the score just reached.
    ProgressUp,
    /// Directory prefix; the file name is `<page><id>.png`.
    ButtonPrefix,
    RitualButton,
    EndingButton,
    ArrowLeft,
    ArrowRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKey {
    TapToStart,
    Welcome,
    Instructions,
    TapToServe,
    TapToEat,
    TapToShare,
    TapToFinish,
    RitualNeedsDress,
    WrongFood,
    WrongDress,
    EndingCall,
    Goodbye,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKey {
    Wake,
    Correct,
    Wrong,
    Baking,
    Eating,
    Sharing,
    Ritual,
    Goodbye,
    Progress,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Food,
    Dress,
    Ritual,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::Food => "food",
            PageKind::Dress => "dress",
            PageKind::Ritual => "ritual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "home" => Some(PageKind::Home),
            "food" => Some(PageKind::Food),
            "dress" => Some(PageKind::Dress),
            "ritual" => Some(PageKind::Ritual),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageConfig {
    pub kind: PageKind,
    #[serde(default)]
    pub buttons: Vec<String>,
}

fn default_pages() -> Vec<PageConfig> {
    let ids = |n: u8| (1..=n).map(|i| i.to_string()).collect::<Vec<_>>();
    vec![
        PageConfig { kind: PageKind::Home, buttons: Vec::new() },
        PageConfig { kind: PageKind::Food, buttons: ids(4) },
        PageConfig { kind: PageKind::Dress, buttons: ids(3) },
        PageConfig { kind: PageKind::Ritual, buttons: Vec::new() },
    ]
}

/// Zone offsets are percentages of the viewport; the rest are pixels.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Layout {
    pub pet_zone_top: f64,
    pub pet_zone_height: f64,
    pub controls_top: f64,
    pub button_radius: f64,
    /// Fraction of the dragged button that must overlap the pet zone.
    pub drop_min_overlap: f64,
    /// Inner fraction of the pet image an undress drag must start in.
    pub undress_inner_ratio: f64,
    /// Release distance from screen center beyond which the pet is undressed.
    pub undress_radius: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            pet_zone_top: 18.0,
            pet_zone_height: 52.0,
            controls_top: 72.0,
            button_radius: 120.0,
            drop_min_overlap: 0.0,
            undress_inner_ratio: 0.5,
            undress_radius: 220.0,
        }
    }
}

/// Durations in milliseconds, thresholds in pixels / m·s⁻².
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Timings {
    pub inactivity_ms: f64,
    pub intro_static_ms: f64,
    pub intro_greeting_ms: f64,
    pub intro_welcome_ms: f64,
    pub intro_instructions_ms: f64,
    pub baking_ms: f64,
    pub eating_ms: f64,
    pub sharing_ms: f64,
    pub ritual_ms: f64,
    pub ending_message_ms: f64,
    pub goodbye_ms: f64,
    pub message_ms: f64,
    pub progress_flash_ms: f64,
    pub snap_back_ms: f64,
    pub swipe_threshold: f64,
    pub shake_threshold: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            inactivity_ms: 60_000.0,
            intro_static_ms: 1_500.0,
            intro_greeting_ms: 3_000.0,
            intro_welcome_ms: 3_000.0,
            intro_instructions_ms: 4_000.0,
            baking_ms: 3_000.0,
            eating_ms: 2_500.0,
            sharing_ms: 2_500.0,
            ritual_ms: 4_000.0,
            ending_message_ms: 3_000.0,
            goodbye_ms: 4_000.0,
            message_ms: 2_000.0,
            progress_flash_ms: 1_200.0,
            snap_back_ms: 300.0,
            swipe_threshold: 50.0,
            shake_threshold: 15.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Hardware {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for Hardware {
    fn default() -> Self {
        Self { enabled: true, endpoint: "http://192.168.1.74/servo".to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugKeys {
    pub wake_key: String,
    pub reset_key: String,
    pub culture: String,
}

impl Default for DebugKeys {
    fn default() -> Self {
        Self { wake_key: "s".to_string(), reset_key: "r".to_string(), culture: "kurd".to_string() }
    }
}

/// Contents of `config/default.json`.
#[derive(Clone, Debug, Deserialize)]
pub struct BaseConfig {
    pub rules: Rules,
    pub assets: BTreeMap<AssetKey, String>,
    #[serde(default)]
    pub texts: BTreeMap<TextKey, String>,
    #[serde(default)]
    pub ending_messages: Vec<String>,
    #[serde(default)]
    pub cues: BTreeMap<CueKey, String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub timings: Timings,
    pub cultures: Vec<String>,
    #[serde(default = "default_pages")]
    pub pages: Vec<PageConfig>,
    #[serde(default)]
    pub gated_navigation: bool,
    #[serde(default)]
    pub hardware: Hardware,
    #[serde(default)]
    pub debug: DebugKeys,
}

#[derive(Debug)]
pub struct ConfigStore {
    base: BaseConfig,
    overrides: HashMap<String, CultureOverride>,
}

impl ConfigStore {
    pub fn from_json(defaults: &str, cultures: &str) -> Result<Self, ConfigError> {
        let base: BaseConfig = serde_json::from_str(defaults)
            .map_err(|source| ConfigError::Json { document: Document::Defaults, source })?;
        let overrides: HashMap<String, CultureOverride> = serde_json::from_str(cultures)
            .map_err(|source| ConfigError::Json { document: Document::Cultures, source })?;
        Self::new(base, overrides)
    }

    pub fn new(
        base: BaseConfig,
        overrides: HashMap<String, CultureOverride>,
    ) -> Result<Self, ConfigError> {
        if base.cultures.is_empty() {
            return Err(ConfigError::NoCultures);
        }
        if base.pages.is_empty() {
            return Err(ConfigError::NoPages);
        }
        let mut seen = HashSet::new();
        for page in &base.pages {
            if !seen.insert(page.kind) {
                return Err(ConfigError::DuplicatePage { page: page.kind.as_str().to_string() });
            }
        }
        for name in overrides.keys() {
            if !base.cultures.contains(name) {
                warn!(culture = %name, "override for a culture that is not in the culture list");
            }
        }
        let store = Self { base, overrides };
        let food_buttons = store
            .page_index(PageKind::Food)
            .map(|i| store.base.pages[i].buttons.as_slice());
        for culture in &store.base.cultures {
            let order = store.rules_for(culture).correct_food_order;
            if order.is_empty() {
                return Err(ConfigError::EmptyFoodOrder { culture: culture.clone() });
            }
            // Every step must be pressable exactly once or the order can never complete.
            let mut seen = HashSet::new();
            for id in &order {
                if !seen.insert(id.as_str()) {
                    return Err(ConfigError::DuplicateFoodItem { culture: culture.clone(), id: id.clone() });
                }
                if food_buttons.is_some_and(|buttons| !buttons.contains(id)) {
                    return Err(ConfigError::UnknownFoodItem { culture: culture.clone(), id: id.clone() });
                }
            }
        }
        Ok(store)
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }

    pub fn cultures(&self) -> &[String] {
        &self.base.cultures
    }

    pub fn is_culture(&self, culture: &str) -> bool {
        self.base.cultures.iter().any(|c| c == culture)
    }

    pub fn timings(&self) -> &Timings {
        &self.base.timings
    }

    pub fn layout(&self) -> &Layout {
        &self.base.layout
    }

    pub fn pages(&self) -> &[PageConfig] {
        &self.base.pages
    }

    pub fn page_index(&self, kind: PageKind) -> Option<usize> {
        self.base.pages.iter().position(|p| p.kind == kind)
    }

    /// Base rules with the culture's overrides applied on a fresh copy.
    pub fn rules_for(&self, culture: &str) -> Rules {
        let mut rules = self.base.rules.clone();
        if let Some(o) = self.overrides.get(culture) {
            if let Some(order) = &o.rules.correct_food_order {
                rules.correct_food_order = order.clone();
            }
            if let Some(dress) = &o.rules.correct_dress_id {
                rules.correct_dress_id = dress.clone();
            }
        }
        rules
    }

    pub fn asset(&self, key: AssetKey, culture: &str, id: Option<&str>) -> String {
        match self.base.assets.get(&key) {
            Some(pattern) => fill_asset(pattern, culture, id),
            None => {
                warn!(?key, "no asset template configured");
                String::new()
            }
        }
    }

    pub fn button_asset(&self, culture: &str, page: PageKind, id: &str) -> String {
        let prefix = self.asset(AssetKey::ButtonPrefix, culture, None);
        format!("{prefix}{}{id}.png", page.as_str())
    }

    pub fn text(&self, key: TextKey, culture: &str) -> String {
        match self.base.texts.get(&key) {
            Some(template) => self.fill_text(template, culture),
            None => String::new(),
        }
    }

    pub fn ending_message(&self, index: usize, culture: &str) -> Option<String> {
        self.base.ending_messages.get(index).map(|t| self.fill_text(t, culture))
    }

    pub fn cue(&self, key: CueKey) -> Option<&str> {
        self.base.cues.get(&key).map(String::as_str)
    }

    fn fill_text(&self, template: &str, culture: &str) -> String {
        let mut out = template.replace("{culture}", culture);
        if let Some(o) = self.overrides.get(culture) {
            for (name, value) in &o.variables {
                out = out.replace(&format!("{{{name}}}"), value);
            }
        }
        out
    }
}

pub fn fill_asset(pattern: &str, culture: &str, id: Option<&str>) -> String {
    let out = pattern.replace("{culture}", culture);
    match id {
        Some(id) => out.replace("{id}", id),
        None => out,
    }
}
