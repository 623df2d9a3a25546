// Integration tests (native) for the `ritual-pet` crate.
// Whole visitor sessions driven through the public `Kiosk` API with a virtual
// clock, using the configuration documents shipped in `www/config`.

use ritual_pet::kiosk::drag::{DragOutcome, DragTarget, Point, Rect};
use ritual_pet::kiosk::gesture::{Direction, MotionSample, Vector3};
use ritual_pet::kiosk::phase::{EndingStep, IntroStep, Phase};
use ritual_pet::kiosk::render::ZoneContent;
use ritual_pet::kiosk::state::{AnimationKind, FoodStage};
use ritual_pet::kiosk::timers::TimerSlot;
use ritual_pet::{ConfigStore, Effect, Geometry, Kiosk, NotifyReason, PageKind};

const FOOD: usize = 1;
const DRESS: usize = 2;
const RITUAL: usize = 3;

fn kiosk() -> Kiosk {
    let cfg = ConfigStore::from_json(
        include_str!("../www/config/default.json"),
        include_str!("../www/config/cultures.json"),
    )
    .expect("shipped config is valid");
    let mut k = Kiosk::new(cfg, Some("kurd"));
    k.set_geometry(Geometry {
        viewport: Rect::new(0.0, 0.0, 1000.0, 1600.0),
        pet_zone: Rect::new(100.0, 300.0, 800.0, 800.0),
    });
    k
}

fn advance(k: &mut Kiosk, ms: f64) {
    let t = k.now() + ms;
    k.tick(t);
}

fn notifications(k: &mut Kiosk) -> Vec<NotifyReason> {
    k.drain_effects()
        .into_iter()
        .filter_map(|e| match e {
            Effect::NotifyHardware(reason) => Some(reason),
            Effect::PlayCue { .. } => None,
        })
        .collect()
}

fn into_gameplay(k: &mut Kiosk) {
    assert!(k.wake());
    assert!(k.tap());
    advance(k, 20_000.0);
    assert_eq!(k.state().phase, Phase::Gameplay);
    k.drain_effects();
}

fn go_to(k: &mut Kiosk, page: usize) {
    while k.state().page_index < page {
        assert!(k.surface_release(400.0, 300.0), "swipe left should advance");
    }
    while k.state().page_index > page {
        assert!(k.surface_release(300.0, 400.0), "swipe right should go back");
    }
}

#[test]
fn wake_intro_and_startup_notification() {
    let mut k = kiosk();
    assert_eq!(k.state().phase, Phase::Asleep);
    assert!(k.render().sleep_overlay);
    assert!(!k.tap(), "tap is ignored while asleep");

    assert!(k.key("S"));
    assert_eq!(k.state().phase, Phase::AwakeIdle);
    assert!(k.drain_effects().contains(&Effect::PlayCue {
        cue: ritual_pet::config::CueKey::Wake,
        path: "audio/wake.mp3".into()
    }));
    assert!(!k.wake(), "already awake");

    assert!(k.surface_release(200.0, 210.0), "short release is a tap");
    assert_eq!(k.state().phase, Phase::Intro(IntroStep::StaticImage));
    advance(&mut k, 1_500.0);
    assert_eq!(k.state().phase, Phase::Intro(IntroStep::Greeting));
    assert_eq!(notifications(&mut k), vec![NotifyReason::StartupAnimation]);
    assert_eq!(k.render().pet_zone, ZoneContent::Empty);

    advance(&mut k, 3_000.0);
    assert_eq!(k.state().phase, Phase::Intro(IntroStep::Welcome));
    assert_eq!(k.render().pet_zone, ZoneContent::Text("Hello! I am your pet from Kurdistan.".into()));
    advance(&mut k, 7_000.0);
    assert_eq!(k.state().phase, Phase::Gameplay);
    assert_eq!(k.state().page_index, 0);
}

#[test]
fn shake_wakes_the_pet() {
    let mut k = kiosk();
    let weak = MotionSample { including_gravity: Some(Vector3 { x: 1.0, y: 9.8, z: 0.0 }), acceleration: None };
    assert!(!k.shake(&weak));
    let strong = MotionSample { including_gravity: Some(Vector3 { x: 20.0, y: 9.8, z: 0.0 }), acceleration: None };
    assert!(k.shake(&strong));
    assert_eq!(k.state().phase, Phase::AwakeIdle);
}

#[test]
fn feeding_runs_from_order_to_done() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, FOOD);
    assert_eq!(k.render().pet_image, "assets/common/bowl0.png");

    for id in ["2", "1", "4"] {
        assert!(k.press_button(PageKind::Food, id));
    }
    assert_eq!(k.render().pet_image, "assets/common/bowl3.png");
    assert!(k.press_button(PageKind::Food, "3"));
    assert!(notifications(&mut k).is_empty());

    let s = k.state();
    assert!(s.progress.food);
    assert_eq!(s.gameplay.food_stage, FoodStage::Baking);
    assert_eq!(s.ui.playing.as_ref().map(|p| p.kind), Some(AnimationKind::Baking));
    let view = k.render();
    assert_eq!(view.progress_bar, "assets/common/progress_up1.png");
    assert!(!view.nav_left && !view.nav_right, "navigation frozen while baking");
    assert!(!k.surface_release(400.0, 300.0));
    assert!(!k.tap(), "taps wait for baking to finish");

    advance(&mut k, 3_000.0);
    assert_eq!(k.state().gameplay.food_stage, FoodStage::Baked);
    assert_eq!(
        k.render().pet_zone,
        ZoneContent::Text("The kulicha is ready. Tap to serve!".into())
    );

    assert!(k.tap());
    assert_eq!(k.state().gameplay.food_stage, FoodStage::ReadyToEat);
    assert!(k.tap());
    assert!(!k.tap(), "eating animation still running");
    advance(&mut k, 2_500.0);
    assert!(k.tap());
    assert_eq!(notifications(&mut k), vec![NotifyReason::FoodSharing]);
    advance(&mut k, 2_500.0);
    assert!(k.tap());
    assert_eq!(k.state().gameplay.food_stage, FoodStage::Done);

    let view = k.render();
    assert!(view.nav_left && view.nav_right);
    assert_eq!(view.controls, ZoneContent::Empty);
    assert_eq!(view.progress_bar, "assets/common/progress1.png");
}

#[test]
fn wrong_food_press_clears_sequence_and_notifies() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, FOOD);
    assert!(k.press_button(PageKind::Food, "2"));
    assert!(!k.press_button(PageKind::Food, "3"));
    assert!(k.state().gameplay.food_sequence.is_empty());
    assert_eq!(notifications(&mut k), vec![NotifyReason::WrongFood]);
    assert_eq!(k.render().pet_zone, ZoneContent::Text("Not that one yet!".into()));
    advance(&mut k, 2_000.0);
    assert_eq!(k.render().pet_zone, ZoneContent::Empty);
}

#[test]
fn wrong_dress_blocks_ritual_without_side_effects() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, DRESS);
    assert!(k.press_button(PageKind::Dress, "2"));
    assert!(k.state().progress.dress);
    go_to(&mut k, RITUAL);
    assert!(!k.trigger_ritual());

    assert_eq!(notifications(&mut k), vec![NotifyReason::WrongDress]);
    let s = k.state();
    assert!(s.ui.playing.is_none());
    assert!(!s.progress.ritual);
    assert_eq!(s.gameplay.chosen_dress.as_deref(), Some("2"));
    assert_eq!(s.phase, Phase::Gameplay);
}

#[test]
fn ritual_leads_through_the_ending() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, DRESS);
    assert!(k.press_button(PageKind::Dress, "1"));
    go_to(&mut k, RITUAL);
    assert!(matches!(k.render().pet_zone, ZoneContent::Button(_)));

    assert!(k.trigger_ritual());
    assert!(!k.trigger_ritual(), "ritual is idempotent");
    assert_eq!(notifications(&mut k), vec![NotifyReason::Ritual]);
    assert!(k.state().progress.ritual);

    advance(&mut k, 4_000.0);
    assert_eq!(k.state().phase, Phase::Ending(EndingStep::ButtonWait));
    assert!(!k.is_scheduled(TimerSlot::Inactivity));
    assert!(!k.trigger_ritual());

    advance(&mut k, 120_000.0);
    assert_eq!(k.state().phase, Phase::Ending(EndingStep::ButtonWait), "no inactivity in the ending");

    assert!(k.press_ending_button());
    assert_eq!(k.state().phase, Phase::Ending(EndingStep::ZoomedMessages { index: 0 }));
    assert!(k.render().pet_zoomed);
    advance(&mut k, 9_000.0);
    assert_eq!(k.state().phase, Phase::Ending(EndingStep::Goodbye));
    assert_eq!(k.state().ui.playing.as_ref().map(|p| p.kind), Some(AnimationKind::Goodbye));
    assert!(!k.render().pet_zoomed);

    advance(&mut k, 60_000.0);
    assert_eq!(k.state().phase, Phase::Ending(EndingStep::Goodbye), "goodbye is terminal");
    assert!(!k.press_ending_button());

    assert!(k.key("r"));
    assert_eq!(k.state().phase, Phase::Asleep);
    assert_eq!(k.state().culture, "kurd");
}

#[test]
fn buttons_are_dropped_on_the_pet() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, FOOD);

    let two = DragTarget::Button { page: PageKind::Food, id: "2".into() };
    let slot = Rect::new(400.0, 1200.0, 80.0, 80.0);
    assert!(k.begin_drag(two.clone(), slot, Point::new(420.0, 1220.0)));
    assert!(!k.begin_drag(DragTarget::Pet, slot, Point::new(420.0, 1220.0)), "one drag at a time");
    assert!(!k.surface_release(400.0, 300.0), "no page change mid-drag");
    assert_eq!(k.move_drag(Point::new(420.0, 620.0)), Some(Rect::new(400.0, 600.0, 80.0, 80.0)));
    assert_eq!(k.floating_rect(&two), Some(Rect::new(400.0, 600.0, 80.0, 80.0)));
    let outcome = k.end_drag(Point::new(420.0, 620.0));
    assert!(matches!(outcome, Some(DragOutcome::Accepted { .. })));
    assert_eq!(k.state().gameplay.food_sequence, vec!["2".to_string()]);
    assert!(!k.is_dragging());
    assert_eq!(k.floating_rect(&two), None);

    // Released outside the pet zone: no press, element animates home.
    let three = DragTarget::Button { page: PageKind::Food, id: "3".into() };
    assert!(k.begin_drag(three.clone(), slot, Point::new(420.0, 1220.0)));
    let outcome = k.end_drag(Point::new(50.0, 1500.0));
    assert!(matches!(outcome, Some(DragOutcome::Rejected(_))));
    assert_eq!(k.state().gameplay.food_sequence, vec!["2".to_string()]);
    assert!(k.floating_rect(&three).is_some());
    advance(&mut k, 300.0);
    assert_eq!(k.floating_rect(&three), None);

    // Dropped on the pet but out of order: refused, snaps back, clears.
    let four = DragTarget::Button { page: PageKind::Food, id: "4".into() };
    assert!(k.begin_drag(four.clone(), slot, Point::new(420.0, 1220.0)));
    let outcome = k.end_drag(Point::new(420.0, 620.0));
    assert!(matches!(outcome, Some(DragOutcome::Rejected(_))));
    assert!(k.state().gameplay.food_sequence.is_empty());
    assert!(k.take_dirty(), "cleared sequence redraws the controls");
    assert!(k.floating_rect(&four).is_some(), "the button is still on its way home");
    assert_eq!(notifications(&mut k), vec![NotifyReason::WrongFood]);
    assert_eq!(k.end_drag(Point::new(0.0, 0.0)), None);
}

#[test]
fn pet_can_be_undressed_by_dragging_it_away() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, DRESS);
    let pet = Rect::new(300.0, 400.0, 400.0, 400.0);
    assert!(!k.begin_drag(DragTarget::Pet, pet, Point::new(500.0, 600.0)), "nothing to take off");

    assert!(k.press_button(PageKind::Dress, "1"));
    assert_eq!(k.render().pet_image, "assets/kurd/pet_dress1.png");
    assert!(!k.begin_drag(DragTarget::Pet, pet, Point::new(310.0, 410.0)), "grab must be near the middle");

    assert!(k.begin_drag(DragTarget::Pet, pet, Point::new(500.0, 600.0)));
    k.move_drag(Point::new(520.0, 650.0));
    assert!(matches!(k.end_drag(Point::new(520.0, 650.0)), Some(DragOutcome::Rejected(_))));
    assert!(k.state().progress.dress);

    advance(&mut k, 300.0);
    assert!(k.begin_drag(DragTarget::Pet, pet, Point::new(500.0, 600.0)));
    assert!(matches!(k.end_drag(Point::new(500.0, 1500.0)), Some(DragOutcome::Accepted { .. })));
    let s = k.state();
    assert_eq!(s.gameplay.chosen_dress, None);
    assert!(!s.progress.dress);
    assert_eq!(k.render().pet_image, "assets/kurd/pet.png");
}

#[test]
fn swipe_threshold_is_inclusive() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    assert!(!k.surface_release(300.0, 251.0));
    assert_eq!(k.state().page_index, 0);
    assert!(k.surface_release(300.0, 250.0));
    assert_eq!(k.state().page_index, FOOD);
    assert!(k.surface_release(250.0, 300.0));
    assert_eq!(k.state().page_index, 0);
    assert!(!k.surface_release(250.0, 400.0), "already on the first page");
}

#[test]
fn inactivity_puts_the_pet_to_sleep() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    let token = k.state().token;
    go_to(&mut k, DRESS);
    assert!(k.press_button(PageKind::Dress, "1"));

    advance(&mut k, 50_000.0);
    assert_eq!(k.state().phase, Phase::Gameplay);
    assert!(k.surface_release(300.0, 400.0), "activity restarts the countdown");
    assert_eq!(k.deadline(TimerSlot::Inactivity), Some(k.now() + 60_000.0));
    advance(&mut k, 59_000.0);
    assert_eq!(k.state().phase, Phase::Gameplay);
    advance(&mut k, 1_000.0);

    let s = k.state();
    assert_eq!(s.phase, Phase::Asleep);
    assert_eq!(s.token, token, "sleeping is not a reset");
    assert_eq!(s.culture, "kurd");
    assert!(s.progress.dress);
    assert_eq!(s.gameplay.chosen_dress.as_deref(), Some("1"));
    assert!(!k.is_scheduled(TimerSlot::Inactivity));
    assert!(!k.is_scheduled(TimerSlot::Sequence));
    assert!(k.render().sleep_overlay);

    // Waking up again continues the same visit.
    assert!(k.wake());
    assert!(k.tap());
    advance(&mut k, 20_000.0);
    let s = k.state();
    assert_eq!(s.phase, Phase::Gameplay);
    assert!(s.progress.dress);
    assert_eq!(s.gameplay.chosen_dress.as_deref(), Some("1"));
}

#[test]
fn gated_navigation_follows_page_completion() {
    let defaults = include_str!("../www/config/default.json")
        .replace("\"gated_navigation\": false", "\"gated_navigation\": true");
    let cfg = ConfigStore::from_json(&defaults, include_str!("../www/config/cultures.json"))
        .expect("gated config is valid");
    assert!(cfg.base().gated_navigation);
    let mut k = Kiosk::new(cfg, Some("kurd"));
    k.set_geometry(Geometry {
        viewport: Rect::new(0.0, 0.0, 1000.0, 1600.0),
        pet_zone: Rect::new(100.0, 300.0, 800.0, 800.0),
    });
    into_gameplay(&mut k);

    assert!(k.navigate(Direction::Next), "home always leads to food");
    assert_eq!(k.state().page_index, FOOD);
    assert!(!k.navigate(Direction::Next), "food page not finished");
    assert!(!k.surface_release(400.0, 300.0));
    assert!(!k.render().nav_right);

    for id in ["2", "1", "4", "3"] {
        assert!(k.press_button(PageKind::Food, id));
    }
    advance(&mut k, 3_000.0);
    assert!(k.tap());
    assert!(k.tap());
    advance(&mut k, 2_500.0);
    assert!(k.tap());
    assert!(!k.state().unlocked[DRESS], "sharing is not the end of feeding");
    advance(&mut k, 2_500.0);
    assert!(k.tap());
    assert_eq!(k.state().gameplay.food_stage, FoodStage::Done);
    assert!(k.state().unlocked[DRESS]);
    assert!(k.navigate(Direction::Next));
    assert_eq!(k.state().page_index, DRESS);

    assert!(!k.navigate(Direction::Next), "ritual locked until a dress is chosen");
    assert!(!k.state().unlocked[RITUAL]);
    assert!(k.press_button(PageKind::Dress, "2"));
    assert!(k.state().unlocked[RITUAL], "any dress opens the ritual page");
    assert!(k.render().nav_right);

    let pet = Rect::new(300.0, 400.0, 400.0, 400.0);
    assert!(k.begin_drag(DragTarget::Pet, pet, Point::new(500.0, 600.0)));
    assert!(matches!(k.end_drag(Point::new(500.0, 1500.0)), Some(DragOutcome::Accepted { .. })));
    assert!(!k.state().progress.dress);
    assert!(k.state().unlocked[RITUAL], "unlocks survive undressing");
    assert!(k.navigate(Direction::Next));
    assert_eq!(k.state().page_index, RITUAL);
    assert!(k.navigate(Direction::Prev));
}

#[test]
fn reset_discards_pending_work() {
    let mut k = kiosk();
    into_gameplay(&mut k);
    go_to(&mut k, FOOD);
    for id in ["2", "1", "4", "3"] {
        k.press_button(PageKind::Food, id);
    }
    assert!(k.is_scheduled(TimerSlot::Animation));

    k.reset_game(Some("maori"));
    assert!(!k.is_scheduled(TimerSlot::Animation));
    assert!(!k.is_scheduled(TimerSlot::Inactivity));
    advance(&mut k, 10_000.0);

    let s = k.state();
    assert_eq!(s.phase, Phase::Asleep);
    assert_eq!(s.culture, "maori");
    assert_eq!(s.rules.correct_food_order, vec!["3", "1", "2", "4"]);
    assert_eq!(s.gameplay.food_stage, FoodStage::Sequencing);
    assert!(s.ui.playing.is_none());
}
