//! Browser shell: loads configuration, owns the `Kiosk` in a thread-local,
//! forwards DOM input to it and runs the frame loop that ticks the clock,
//! applies view patches and carries out effects.

mod dom;
mod net;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, DeviceAcceleration, DeviceMotionEvent, Event, EventTarget, HtmlAudioElement,
    HtmlElement, HtmlImageElement, KeyboardEvent, window,
};

use crate::config::Hardware;
use crate::kiosk::drag::{DragTarget, Point};
use crate::kiosk::gesture::{Direction, MotionSample, Vector3};
use crate::kiosk::render::{self, ButtonAction, View, Zone};
use crate::kiosk::{Effect, Geometry, Kiosk};

/// An element currently positioned by the drag protocol.
struct Floating {
    target: DragTarget,
    element: HtmlElement,
    saved_style: Option<String>,
}

struct Shell {
    kiosk: Kiosk,
    last_view: Option<View>,
    floating: Vec<Floating>,
    surface_start: Option<f64>,
    /// A zone rebuild was deferred and still has to be applied.
    held: bool,
}

thread_local! {
    static SHELL: RefCell<Option<Shell>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

pub async fn start() -> Result<(), JsValue> {
    let config = match net::load_config().await {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "configuration failed to load");
            return Err(JsValue::from_str(&err.to_string()));
        }
    };
    dom::apply_layout(config.layout())?;
    let mut kiosk = Kiosk::new(config, None);
    kiosk.tick(dom::now());
    kiosk.set_geometry(geometry());
    SHELL.with(|cell| {
        *cell.borrow_mut() = Some(Shell { kiosk, last_view: None, floating: Vec::new(), surface_start: None, held: false });
    });

    install_listeners()?;
    start_loop();
    info!("kiosk started");
    Ok(())
}

/// Runs `f` against the live shell after bringing the clock up to date.
/// The borrow never outlives the call.
fn with_shell<R>(f: impl FnOnce(&mut Shell) -> R) -> Option<R> {
    SHELL.with(|cell| {
        cell.borrow_mut().as_mut().map(|shell| {
            shell.kiosk.tick(dom::now());
            f(shell)
        })
    })
}

fn geometry() -> Geometry {
    Geometry {
        viewport: dom::viewport(),
        pet_zone: dom::by_id(dom::PET_ZONE).map(|el| dom::rect_of(&el)).unwrap_or_default(),
    }
}

fn listen(target: &EventTarget, kind: &str, passive: bool, handler: impl FnMut(Event) + 'static) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    let opts = AddEventListenerOptions::new();
    opts.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &opts,
    )?;
    closure.forget();
    Ok(())
}

fn install_listeners() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = dom::document()?;

    listen(&doc, "keydown", true, |evt| {
        let evt: KeyboardEvent = evt.unchecked_into();
        with_shell(|s| s.kiosk.key(&evt.key()));
    })?;

    listen(&win, "devicemotion", true, |evt| {
        let evt: DeviceMotionEvent = evt.unchecked_into();
        let vector = |a: Option<DeviceAcceleration>| {
            a.map(|a| Vector3 { x: a.x().unwrap_or(0.0), y: a.y().unwrap_or(0.0), z: a.z().unwrap_or(0.0) })
        };
        let sample = MotionSample {
            including_gravity: vector(evt.acceleration_including_gravity()),
            acceleration: vector(evt.acceleration()),
        };
        with_shell(|s| s.kiosk.shake(&sample));
    })?;

    listen(&win, "resize", true, |_| {
        with_shell(|s| s.kiosk.set_geometry(geometry()));
    })?;
    listen(&win, "blur", true, |_| {
        with_shell(|s| s.kiosk.cancel_drag());
    })?;

    // Main surface: swipe to navigate, short release is a tap.
    let surface = dom::require(dom::SURFACE)?;
    for kind in ["mousedown", "touchstart"] {
        listen(&surface, kind, true, |evt| {
            if let Some(p) = dom::pointer_of(&evt, false) {
                with_shell(|s| s.surface_start = Some(p.x));
            }
        })?;
    }
    for kind in ["mouseup", "touchend"] {
        listen(&surface, kind, true, |evt| {
            let Some(p) = dom::pointer_of(&evt, true) else {
                return;
            };
            with_shell(|s| {
                if let Some(start) = s.surface_start.take() {
                    if !s.kiosk.is_dragging() {
                        s.kiosk.surface_release(start, p.x);
                    }
                }
            });
        })?;
    }

    for (id, direction) in [(dom::NAV_LEFT, Direction::Prev), (dom::NAV_RIGHT, Direction::Next)] {
        let nav = dom::require(id)?;
        for kind in ["mousedown", "touchstart"] {
            listen(&nav, kind, true, |evt| evt.stop_propagation())?;
        }
        listen(&nav, "click", true, move |evt| {
            evt.stop_propagation();
            with_shell(|s| s.kiosk.navigate(direction));
        })?;
    }

    // Zone content is rebuilt on every change, so listeners sit on the zones.
    for id in [dom::PET_CONTENT, dom::CONTROLS] {
        let zone = dom::require(id)?;
        listen(&zone, "click", true, |evt| {
            let Some(el) = dom::action_element(evt.target()) else {
                return;
            };
            evt.stop_propagation();
            if dom::is_draggable(&el) {
                return;
            }
            if let Some(action) = dom::button_action(&el) {
                with_shell(|s| dispatch(&mut s.kiosk, action));
            }
        })?;
        for kind in ["mousedown", "touchstart"] {
            listen(&zone, kind, false, |evt| {
                let Some(el) = dom::action_element(evt.target()) else {
                    return;
                };
                evt.stop_propagation();
                if !dom::is_draggable(&el) {
                    return;
                }
                let (Some(ButtonAction::Minigame { page, id }), Some(pointer)) =
                    (dom::button_action(&el), dom::pointer_of(&evt, false))
                else {
                    return;
                };
                if let Ok(el) = el.dyn_into::<HtmlElement>() {
                    begin_drag(&evt, DragTarget::Button { page, id }, el, pointer);
                }
            })?;
        }
    }

    let pet = dom::require(dom::PET_IMAGE)?;
    for kind in ["mousedown", "touchstart"] {
        let el = pet.clone();
        listen(&pet, kind, false, move |evt| {
            if let Some(pointer) = dom::pointer_of(&evt, false) {
                begin_drag(&evt, DragTarget::Pet, el.clone(), pointer);
            }
        })?;
    }

    for kind in ["mousemove", "touchmove"] {
        listen(&doc, kind, false, |evt| {
            let Some(pointer) = dom::pointer_of(&evt, false) else {
                return;
            };
            let moved = with_shell(|s| s.kiosk.move_drag(pointer).is_some()).unwrap_or(false);
            if moved {
                evt.prevent_default();
            }
        })?;
    }
    for kind in ["mouseup", "touchend"] {
        listen(&doc, kind, true, |evt| {
            let pointer = dom::pointer_of(&evt, true);
            with_shell(|s| match pointer {
                Some(p) => {
                    s.kiosk.end_drag(p);
                }
                None => s.kiosk.cancel_drag(),
            });
        })?;
    }
    listen(&doc, "touchcancel", true, |_| {
        with_shell(|s| s.kiosk.cancel_drag());
    })?;

    for id in [dom::PET_IMAGE, dom::PROGRESS_IMAGE] {
        let img = dom::require(id)?;
        listen(&img, "error", true, move |evt| {
            let src = evt
                .target()
                .and_then(|t| t.dyn_into::<HtmlImageElement>().ok())
                .map(|img| img.src())
                .unwrap_or_default();
            warn!(element = id, %src, "image failed to load");
        })?;
    }
    Ok(())
}

fn begin_drag(evt: &Event, target: DragTarget, element: HtmlElement, pointer: Point) {
    let began = with_shell(|s| {
        if !s.kiosk.begin_drag(target.clone(), dom::rect_of(&element), pointer) {
            return false;
        }
        if !s.floating.iter().any(|f| f.target == target) {
            let saved_style = element.get_attribute("style");
            s.floating.push(Floating { target, element, saved_style });
        }
        true
    })
    .unwrap_or(false);
    if began {
        evt.prevent_default();
        evt.stop_propagation();
    }
}

fn dispatch(kiosk: &mut Kiosk, action: ButtonAction) -> bool {
    match action {
        ButtonAction::Minigame { page, id } => kiosk.press_button(page, &id),
        ButtonAction::Ritual => kiosk.trigger_ritual(),
        ButtonAction::EndingContinue => kiosk.press_ending_button(),
    }
}

fn start_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        frame(ts);
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

fn frame(now: f64) {
    let pending = SHELL.with(|cell| {
        let mut guard = cell.borrow_mut();
        let shell = guard.as_mut()?;
        shell.kiosk.tick(now);
        if shell.kiosk.take_dirty() || shell.held {
            let mut view = shell.kiosk.render();
            let mut patches = render::diff(shell.last_view.as_ref(), &view);
            // Control buttons live in the controls zone; keep it intact until
            // every dragged or returning button has settled.
            let floating = shell
                .floating
                .iter()
                .any(|f| matches!(f.target, DragTarget::Button { .. }) && shell.kiosk.floating_rect(&f.target).is_some());
            shell.held = floating
                && render::hold_zone(&mut patches, &mut view, shell.last_view.as_ref(), Zone::Controls);
            if let Err(err) = dom::apply(&patches, shell.kiosk.config().layout()) {
                warn!(error = ?err, "view patch failed");
            }
            shell.last_view = Some(view);
        }
        let kiosk = &shell.kiosk;
        shell.floating.retain(|f| {
            let rect = kiosk.floating_rect(&f.target);
            if let Err(err) = dom::place(&f.element, rect, f.saved_style.as_deref()) {
                warn!(error = ?err, "could not position dragged element");
            }
            rect.is_some()
        });
        let effects = shell.kiosk.drain_effects();
        Some((effects, shell.kiosk.config().base().hardware.clone()))
    });
    if let Some((effects, hardware)) = pending {
        for effect in effects {
            run_effect(effect, &hardware);
        }
    }
}

fn run_effect(effect: Effect, hardware: &Hardware) {
    match effect {
        Effect::NotifyHardware(reason) => net::notify_hardware(hardware, reason),
        Effect::PlayCue { cue, path } => match HtmlAudioElement::new_with_src(&path) {
            Ok(audio) => {
                if let Err(err) = audio.play() {
                    warn!(?cue, error = ?err, "audio cue did not play");
                }
            }
            Err(err) => warn!(?cue, %path, error = ?err, "audio cue could not be created"),
        },
    }
}
