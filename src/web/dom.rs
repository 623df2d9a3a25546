//! DOM lookups and patch application.

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlElement, HtmlImageElement, MouseEvent, TouchEvent, window};

use crate::config::{Layout, PageKind};
use crate::kiosk::drag::{Point, Rect};
use crate::kiosk::render::{self, ButtonAction, ControlButton, Patch, Zone, ZoneContent};

pub const PET_ZONE: &str = "section2";
pub const CONTROLS: &str = "section3";
pub const PET_IMAGE: &str = "pet-image";
pub const PROGRESS_IMAGE: &str = "progress-bar-image";
pub const PET_CONTENT: &str = "pet-content-zone";
pub const SLEEP_OVERLAY: &str = "black-screen-overlay";
pub const NAV_LEFT: &str = "nav-container-left";
pub const NAV_RIGHT: &str = "nav-container-right";
pub const ARROW_LEFT: &str = "nav-arrow-left";
pub const ARROW_RIGHT: &str = "nav-arrow-right";
pub const SURFACE: &str = "oval-container";

pub fn document() -> Result<web_sys::Document, JsValue> {
    window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn by_id(id: &str) -> Option<HtmlElement> {
    let doc = document().ok()?;
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn require(id: &str) -> Result<HtmlElement, JsValue> {
    by_id(id).ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))
}

pub fn now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

pub fn rect_of(el: &Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

pub fn viewport() -> Rect {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    match window() {
        Some(w) => Rect::new(0.0, 0.0, dim(w.inner_width()), dim(w.inner_height())),
        None => Rect::default(),
    }
}

/// Element under the pointer carrying `data-action`, if any.
pub fn action_element(target: Option<web_sys::EventTarget>) -> Option<Element> {
    let el = target?.dyn_into::<Element>().ok()?;
    el.closest("[data-action]").ok().flatten()
}

/// Decoded `data-*` attributes of a control button.
pub fn button_action(el: &Element) -> Option<ButtonAction> {
    match el.get_attribute("data-action")?.as_str() {
        "minigame" => {
            let page = PageKind::parse(&el.get_attribute("data-page")?)?;
            let id = el.get_attribute("data-id")?;
            Some(ButtonAction::Minigame { page, id })
        }
        "ritual" => Some(ButtonAction::Ritual),
        "ending" => Some(ButtonAction::EndingContinue),
        _ => None,
    }
}

pub fn is_draggable(el: &Element) -> bool {
    el.get_attribute("data-draggable").as_deref() == Some("true")
}

pub fn apply(patches: &[Patch], layout: &Layout) -> Result<(), JsValue> {
    for patch in patches {
        match patch {
            Patch::SleepOverlay(on) => set_shown(SLEEP_OVERLAY, *on)?,
            Patch::PetImage(src) => set_image(PET_IMAGE, src),
            Patch::PetZoom(on) => {
                if let Some(el) = by_id(PET_IMAGE) {
                    el.class_list().toggle_with_force("zoomed", *on)?;
                }
            }
            Patch::ProgressBar(src) => set_image(PROGRESS_IMAGE, src),
            Patch::Zone(zone, content) => {
                let id = match zone {
                    Zone::Pet => PET_CONTENT,
                    Zone::Controls => CONTROLS,
                };
                if let Some(el) = by_id(id) {
                    fill_zone(&el, content, layout)?;
                }
            }
            Patch::NavLeft(on) => set_shown(NAV_LEFT, *on)?,
            Patch::NavRight(on) => set_shown(NAV_RIGHT, *on)?,
            Patch::Arrows { left, right } => {
                set_image(ARROW_LEFT, left);
                set_image(ARROW_RIGHT, right);
            }
        }
    }
    Ok(())
}

/// Positions the pet and control zones from the configured layout.
pub fn apply_layout(layout: &Layout) -> Result<(), JsValue> {
    let pct = |v: f64| format!("{v}%");
    if let Some(el) = by_id(PET_ZONE) {
        el.style().set_property("top", &pct(layout.pet_zone_top))?;
        el.style().set_property("height", &pct(layout.pet_zone_height))?;
    }
    if let Some(el) = by_id(CONTROLS) {
        el.style().set_property("top", &pct(layout.controls_top))?;
    }
    Ok(())
}

/// Pins a floating element at `rect`, or restores its saved inline style.
pub fn place(el: &HtmlElement, rect: Option<Rect>, saved_style: Option<&str>) -> Result<(), JsValue> {
    match rect {
        Some(r) => {
            let style = el.style();
            style.set_property("position", "fixed")?;
            style.set_property("left", &format!("{}px", r.left))?;
            style.set_property("top", &format!("{}px", r.top))?;
            style.set_property("width", &format!("{}px", r.width))?;
            style.set_property("height", &format!("{}px", r.height))?;
            style.set_property("z-index", "1000")?;
        }
        None => match saved_style {
            Some(s) => el.set_attribute("style", s)?,
            None => el.remove_attribute("style")?,
        },
    }
    Ok(())
}

/// Pointer position of a mouse or touch event; for touch, `ended` reads the
/// touches that were just lifted.
pub fn pointer_of(evt: &Event, ended: bool) -> Option<Point> {
    if evt.type_().starts_with("touch") {
        let evt: &TouchEvent = evt.unchecked_ref();
        let list = if ended { evt.changed_touches() } else { evt.touches() };
        list.get(0).map(|t| Point::new(t.client_x() as f64, t.client_y() as f64))
    } else {
        let evt: &MouseEvent = evt.unchecked_ref();
        Some(Point::new(evt.client_x() as f64, evt.client_y() as f64))
    }
}

fn set_shown(id: &str, shown: bool) -> Result<(), JsValue> {
    if let Some(el) = by_id(id) {
        el.style().set_property("display", display_value(shown))?;
    }
    Ok(())
}

// The nav containers are hidden by the stylesheet, so showing needs an
// explicit value rather than clearing the inline one.
fn display_value(shown: bool) -> &'static str {
    if shown { "block" } else { "none" }
}

fn set_image(id: &str, src: &str) {
    let Some(img) = by_id(id).and_then(|el| el.dyn_into::<HtmlImageElement>().ok()) else {
        warn!(element = id, "image element missing");
        return;
    };
    if img.get_attribute("src").as_deref() != Some(src) {
        img.set_src(src);
    }
}

fn fill_zone(el: &HtmlElement, content: &ZoneContent, layout: &Layout) -> Result<(), JsValue> {
    el.set_inner_html("");
    let doc = document()?;
    match content {
        ZoneContent::Empty => {}
        ZoneContent::Text(text) => {
            let p = doc.create_element("div")?;
            p.set_class_name("zone-text");
            p.set_text_content(Some(text));
            el.append_child(&p)?;
        }
        ZoneContent::Button(button) => {
            let b = button_element(&doc, button)?;
            el.append_child(&b)?;
        }
        ZoneContent::Buttons(buttons) => {
            for (i, button) in buttons.iter().enumerate() {
                let b = button_element(&doc, button)?;
                let (x, y, size) = render::button_arc_position(i, buttons.len(), layout.button_radius);
                b.set_attribute(
                    "style",
                    &format!(
                        "position:absolute; left:calc(50% + {x:.1}px - {h:.1}px); bottom:{y:.1}px; width:{size:.1}px; height:{size:.1}px;{hidden}",
                        h = size / 2.0,
                        hidden = if button.visible { "" } else { " display:none;" },
                    ),
                )?;
                el.append_child(&b)?;
            }
        }
    }
    Ok(())
}

fn button_element(doc: &web_sys::Document, button: &ControlButton) -> Result<Element, JsValue> {
    let wrap = doc.create_element("div")?;
    wrap.set_class_name("control-button");
    match &button.action {
        ButtonAction::Minigame { page, id } => {
            wrap.set_attribute("data-action", "minigame")?;
            wrap.set_attribute("data-page", page.as_str())?;
            wrap.set_attribute("data-id", id)?;
        }
        ButtonAction::Ritual => wrap.set_attribute("data-action", "ritual")?,
        ButtonAction::EndingContinue => wrap.set_attribute("data-action", "ending")?,
    }
    wrap.set_attribute("data-draggable", if button.draggable { "true" } else { "false" })?;
    if !button.asset.is_empty() {
        let img = doc.create_element("img")?;
        img.set_attribute("src", &button.asset)?;
        img.set_attribute("draggable", "false")?;
        wrap.append_child(&img)?;
    }
    if let Some(label) = &button.label {
        let span = doc.create_element("span")?;
        span.set_text_content(Some(label));
        wrap.append_child(&span)?;
    }
    if !button.visible {
        wrap.set_attribute("style", "display:none;")?;
    }
    Ok(wrap)
}
