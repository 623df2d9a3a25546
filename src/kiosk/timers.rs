//! Slot-keyed cancellable timers on a virtual millisecond clock.
//!
//! A slot holds at most one pending task; scheduling into an occupied slot
//! replaces the old task. Every task also records the session token it was
//! scheduled under so a continuation that outlives a reset can be dropped.

use std::collections::BTreeMap;

use super::render::Zone;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerSlot {
    Inactivity,
    /// Timed intro / ending steps.
    Sequence,
    Animation,
    ProgressFlash,
    Message(Zone),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    FallAsleep,
    AdvanceSequence,
    FinishAnimation,
    SettleProgress,
    ClearMessage(Zone),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Task {
    pub due_ms: f64,
    pub token: u64,
    pub action: TimerAction,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TimerSlot, Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the task that was replaced, if any.
    pub fn schedule(&mut self, slot: TimerSlot, due_ms: f64, token: u64, action: TimerAction) -> Option<Task> {
        self.tasks.insert(slot, Task { due_ms, token, action })
    }

    pub fn cancel(&mut self, slot: TimerSlot) -> bool {
        self.tasks.remove(&slot).is_some()
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn is_scheduled(&self, slot: TimerSlot) -> bool {
        self.tasks.contains_key(&slot)
    }

    pub fn due_at(&self, slot: TimerSlot) -> Option<f64> {
        self.tasks.get(&slot).map(|t| t.due_ms)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes and returns the earliest task due at `now_ms` (ties resolved
    /// by slot order).
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TimerSlot, Task)> {
        let slot = self
            .tasks
            .iter()
            .filter(|(_, t)| t.due_ms <= now_ms)
            .min_by(|a, b| a.1.due_ms.total_cmp(&b.1.due_ms))
            .map(|(slot, _)| *slot)?;
        self.tasks.remove(&slot).map(|t| (slot, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_task_per_slot() {
        let mut s = Scheduler::new();
        assert!(s.schedule(TimerSlot::Inactivity, 100.0, 1, TimerAction::FallAsleep).is_none());
        let old = s.schedule(TimerSlot::Inactivity, 250.0, 1, TimerAction::FallAsleep);
        assert_eq!(old.map(|t| t.due_ms), Some(100.0));
        assert_eq!(s.len(), 1);
        assert_eq!(s.pop_due(200.0), None);
        assert_eq!(s.pop_due(250.0).map(|(slot, _)| slot), Some(TimerSlot::Inactivity));
        assert!(s.is_empty());
    }

    #[test]
    fn pops_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(TimerSlot::Animation, 300.0, 7, TimerAction::FinishAnimation);
        s.schedule(TimerSlot::Message(Zone::Pet), 100.0, 7, TimerAction::ClearMessage(Zone::Pet));
        s.schedule(TimerSlot::Sequence, 200.0, 7, TimerAction::AdvanceSequence);
        let order: Vec<_> = std::iter::from_fn(|| s.pop_due(1_000.0)).map(|(slot, _)| slot).collect();
        assert_eq!(
            order,
            vec![TimerSlot::Message(Zone::Pet), TimerSlot::Sequence, TimerSlot::Animation]
        );
    }

    #[test]
    fn cancel_clears_slots() {
        let mut s = Scheduler::new();
        s.schedule(TimerSlot::Sequence, 10.0, 1, TimerAction::AdvanceSequence);
        s.schedule(TimerSlot::ProgressFlash, 10.0, 1, TimerAction::SettleProgress);
        assert!(s.cancel(TimerSlot::Sequence));
        assert!(!s.cancel(TimerSlot::Sequence));
        assert_eq!(s.cancel_all(), 1);
        assert_eq!(s.pop_due(f64::MAX), None);
    }
}
