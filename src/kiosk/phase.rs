//! Macro lifecycle of the kiosk and its transition table.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroStep {
    StaticImage,
    Greeting,
    Welcome,
    Instructions,
}

impl IntroStep {
    pub fn next(self) -> Option<IntroStep> {
        match self {
            IntroStep::StaticImage => Some(IntroStep::Greeting),
            IntroStep::Greeting => Some(IntroStep::Welcome),
            IntroStep::Welcome => Some(IntroStep::Instructions),
            IntroStep::Instructions => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndingStep {
    /// Call-to-action shown; a click is required to go on.
    ButtonWait,
    /// Pet is zoomed while the ending messages play one by one.
    ZoomedMessages { index: usize },
    Goodbye,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Asleep,
    AwakeIdle,
    Intro(IntroStep),
    Gameplay,
    Ending(EndingStep),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    Wake,
    Activate,
    /// The timed hold of the current intro / ending step ran out.
    StepElapsed,
    RitualComplete,
    Continue,
    Sleep,
}

impl Phase {
    /// Returns the next phase, or `None` when `event` is not legal here.
    /// `ending_messages` is the number of zoomed messages to show.
    pub fn on(self, event: PhaseEvent, ending_messages: usize) -> Option<Phase> {
        use EndingStep::*;
        use PhaseEvent::*;
        match (self, event) {
            (Phase::Asleep, Wake) => Some(Phase::AwakeIdle),
            (Phase::AwakeIdle, Activate) => Some(Phase::Intro(IntroStep::StaticImage)),
            (Phase::Intro(step), StepElapsed) => Some(match step.next() {
                Some(next) => Phase::Intro(next),
                None => Phase::Gameplay,
            }),
            (Phase::Gameplay, RitualComplete) => Some(Phase::Ending(ButtonWait)),
            (Phase::Ending(ButtonWait), Continue) => Some(Phase::Ending(zoomed_or_goodbye(0, ending_messages))),
            (Phase::Ending(ZoomedMessages { index }), StepElapsed) => {
                Some(Phase::Ending(zoomed_or_goodbye(index + 1, ending_messages)))
            }
            (Phase::AwakeIdle | Phase::Intro(_) | Phase::Gameplay, Sleep) => Some(Phase::Asleep),
            _ => None,
        }
    }

    pub fn is_awake(self) -> bool {
        matches!(self, Phase::AwakeIdle | Phase::Intro(_) | Phase::Gameplay)
    }

    pub fn is_zoomed(self) -> bool {
        matches!(self, Phase::Ending(EndingStep::ZoomedMessages { .. }))
    }
}

fn zoomed_or_goodbye(index: usize, count: usize) -> EndingStep {
    if index < count {
        EndingStep::ZoomedMessages { index }
    } else {
        EndingStep::Goodbye
    }
}
