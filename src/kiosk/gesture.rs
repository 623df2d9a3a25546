//! Swipe and shake recognition, plus clamped page stepping.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Horizontal swipe: leftward motion goes to the next page.
pub fn swipe_direction(start_x: f64, end_x: f64, threshold: f64) -> Option<Direction> {
    let dx = end_x - start_x;
    if dx.abs() < threshold {
        None
    } else if dx < 0.0 {
        Some(Direction::Next)
    } else {
        Some(Direction::Prev)
    }
}

pub fn step_page(index: usize, count: usize, direction: Direction) -> usize {
    match direction {
        Direction::Prev => index.saturating_sub(1),
        Direction::Next => (index + 1).min(count.saturating_sub(1)),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One device-motion reading; browsers may provide either vector.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionSample {
    pub including_gravity: Option<Vector3>,
    pub acceleration: Option<Vector3>,
}

/// Threshold is halved when only gravity-free acceleration is available.
pub fn is_shake(sample: &MotionSample, threshold: f64) -> bool {
    match (sample.including_gravity, sample.acceleration) {
        (Some(g), _) => g.magnitude() > threshold,
        (None, Some(a)) => a.magnitude() > threshold / 2.0,
        (None, None) => false,
    }
}
