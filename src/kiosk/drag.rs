//! Drag-and-drop protocol: one explicit session per active drag, drop-zone
//! tests on release, and a timed snap-back for rejected drops.

use crate::config::PageKind;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    /// Edges touching counts as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.left
            || self.left > other.right()
            || self.bottom() < other.top
            || self.top > other.bottom())
    }

    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.left.max(other.left);
        let h = self.bottom().min(other.bottom()) - self.top.max(other.top);
        w.max(0.0) * h.max(0.0)
    }

    /// Centered sub-rectangle scaled by `ratio` on both axes.
    pub fn inner(&self, ratio: f64) -> Rect {
        let w = self.width * ratio;
        let h = self.height * ratio;
        Rect::new(self.left + (self.width - w) / 2.0, self.top + (self.height - h) / 2.0, w, h)
    }

    fn lerp(&self, to: &Rect, t: f64) -> Rect {
        Rect::new(
            self.left + (to.left - self.left) * t,
            self.top + (to.top - self.top) * t,
            self.width + (to.width - self.width) * t,
            self.height + (to.height - self.height) * t,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DragTarget {
    Button { page: PageKind, id: String },
    Pet,
}

/// Drop tolerance rule tested against the element's rect on release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DropZone {
    /// Element must touch `target`, and cover at least `min_ratio` of its
    /// own area with it.
    Overlap { target: Rect, min_ratio: f64 },
    NearCenter { center: Point, max_distance: f64 },
    OutsideRadius { center: Point, min_distance: f64 },
}

impl DropZone {
    pub fn admits(&self, element: &Rect) -> bool {
        match *self {
            DropZone::Overlap { target, min_ratio } => {
                if !element.intersects(&target) {
                    return false;
                }
                let area = element.area();
                area <= 0.0 || element.overlap_area(&target) / area >= min_ratio
            }
            DropZone::NearCenter { center, max_distance } => element.center().distance(center) <= max_distance,
            DropZone::OutsideRadius { center, min_distance } => element.center().distance(center) > min_distance,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub target: DragTarget,
    /// Layout position before the element went free-floating.
    pub origin: Rect,
    pub start: Point,
    /// Pointer offset inside the element at grab time.
    pub grab_offset: Point,
    pub current: Rect,
}

impl DragSession {
    pub fn begin(target: DragTarget, origin: Rect, pointer: Point) -> Self {
        Self {
            target,
            origin,
            start: pointer,
            grab_offset: Point::new(pointer.x - origin.left, pointer.y - origin.top),
            current: origin,
        }
    }

    pub fn move_to(&mut self, pointer: Point) -> Rect {
        self.current.left = pointer.x - self.grab_offset.x;
        self.current.top = pointer.y - self.grab_offset.y;
        self.current
    }

    /// Consumes the session. `accept` runs at most once, and only when the
    /// element is inside `zone`; it may mutate anything it captured.
    pub fn release(
        self,
        zone: &DropZone,
        now_ms: f64,
        snap_ms: f64,
        accept: impl FnOnce(&DragTarget) -> bool,
    ) -> DragOutcome {
        if zone.admits(&self.current) && accept(&self.target) {
            DragOutcome::Accepted { target: self.target, at: self.current }
        } else {
            DragOutcome::Rejected(SnapBack {
                target: self.target,
                from: self.current,
                to: self.origin,
                started_ms: now_ms,
                duration_ms: snap_ms,
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
    Accepted { target: DragTarget, at: Rect },
    Rejected(SnapBack),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapBack {
    pub target: DragTarget,
    pub from: Rect,
    pub to: Rect,
    pub started_ms: f64,
    pub duration_ms: f64,
}

impl SnapBack {
    pub fn position_at(&self, now_ms: f64) -> Rect {
        if self.is_finished(now_ms) {
            return self.to;
        }
        let t = ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0);
        self.from.lerp(&self.to, t)
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.duration_ms <= 0.0 || now_ms >= self.started_ms + self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> DragTarget {
        DragTarget::Button { page: PageKind::Food, id: "2".into() }
    }

    #[test]
    fn moves_by_net_translation() {
        let mut s = DragSession::begin(button(), Rect::new(100.0, 400.0, 60.0, 60.0), Point::new(110.0, 420.0));
        let r = s.move_to(Point::new(150.0, 300.0));
        assert_eq!(r, Rect::new(140.0, 280.0, 60.0, 60.0));
    }

    #[test]
    fn accept_runs_once_inside_zone() {
        let zone = DropZone::Overlap { target: Rect::new(0.0, 0.0, 300.0, 300.0), min_ratio: 0.5 };
        let mut s = DragSession::begin(button(), Rect::new(100.0, 400.0, 60.0, 60.0), Point::new(110.0, 420.0));
        s.move_to(Point::new(110.0, 220.0));
        let mut calls = 0;
        let outcome = s.release(&zone, 0.0, 300.0, |_| {
            calls += 1;
            true
        });
        assert_eq!(calls, 1);
        assert!(matches!(outcome, DragOutcome::Accepted { .. }));
    }

    #[test]
    fn outside_zone_snaps_back_without_calling_accept() {
        let zone = DropZone::Overlap { target: Rect::new(0.0, 0.0, 300.0, 300.0), min_ratio: 0.0 };
        let origin = Rect::new(100.0, 400.0, 60.0, 60.0);
        let mut s = DragSession::begin(button(), origin, Point::new(110.0, 420.0));
        s.move_to(Point::new(500.0, 500.0));
        let mut called = false;
        let outcome = s.release(&zone, 1_000.0, 300.0, |_| {
            called = true;
            true
        });
        assert!(!called);
        let DragOutcome::Rejected(snap) = outcome else { panic!("expected snap-back") };
        assert_ne!(snap.position_at(1_150.0), origin);
        assert_eq!(snap.position_at(1_300.0), origin);
        assert!(snap.is_finished(1_300.0));
    }

    #[test]
    fn refused_callback_also_snaps_back() {
        let zone = DropZone::NearCenter { center: Point::new(130.0, 430.0), max_distance: 10.0 };
        let s = DragSession::begin(button(), Rect::new(100.0, 400.0, 60.0, 60.0), Point::new(110.0, 420.0));
        assert!(matches!(s.release(&zone, 0.0, 300.0, |_| false), DragOutcome::Rejected(_)));
    }

    #[test]
    fn overlap_ratio_and_radius_rules() {
        let target = Rect::new(0.0, 0.0, 100.0, 100.0);
        let half_in = Rect::new(50.0, 0.0, 100.0, 100.0);
        assert!(DropZone::Overlap { target, min_ratio: 0.5 }.admits(&half_in));
        assert!(!DropZone::Overlap { target, min_ratio: 0.6 }.admits(&half_in));
        let touching = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert!(DropZone::Overlap { target, min_ratio: 0.0 }.admits(&touching));
        let far = DropZone::OutsideRadius { center: Point::new(0.0, 0.0), min_distance: 50.0 };
        assert!(far.admits(&Rect::new(90.0, 90.0, 20.0, 20.0)));
        assert!(!far.admits(&Rect::new(-10.0, -10.0, 20.0, 20.0)));
    }

    #[test]
    fn inner_rect_is_centered() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0).inner(0.5);
        assert_eq!(r, Rect::new(50.0, 25.0, 100.0, 50.0));
    }
}
