//! Diagonal-pair gait coordinator.
//!
//! Quadrupeds stay statically stable if diagonal legs step together: the
//! two planted feet always straddle the body. The coordinator offers the
//! step trigger to one diagonal pair at a time and only hands over to the
//! other pair once neither member of the active pair is mid-step.

use nalgebra::Vector3;
use tracing::trace;

use strider_core::types::LegId;

use crate::stepper::LegStepper;

/// One of the two diagonal leg pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagonalPair {
    /// Front-left with back-right.
    LeftLead,
    /// Front-right with back-left.
    RightLead,
}

impl DiagonalPair {
    /// Both pairs, in the order they take turns.
    pub const ALL: [Self; 2] = [Self::LeftLead, Self::RightLead];

    /// Legs in this pair, front leg first.
    #[must_use]
    pub const fn legs(self) -> [LegId; 2] {
        match self {
            Self::LeftLead => [LegId::FrontLeft, LegId::BackRight],
            Self::RightLead => [LegId::FrontRight, LegId::BackLeft],
        }
    }

    /// The pair a leg belongs to.
    #[must_use]
    pub const fn of(leg: LegId) -> Self {
        match leg {
            LegId::FrontLeft | LegId::BackRight => Self::LeftLead,
            LegId::FrontRight | LegId::BackLeft => Self::RightLead,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::LeftLead => Self::RightLead,
            Self::RightLead => Self::LeftLead,
        }
    }

    #[must_use]
    pub fn contains(self, leg: LegId) -> bool {
        self.legs().contains(&leg)
    }

    /// Whether any member of this pair is mid-step.
    #[must_use]
    pub fn any_moving(self, legs: &[LegStepper; 4]) -> bool {
        self.legs().iter().any(|leg| legs[leg.index()].moving())
    }
}

/// Number of diagonal pairs with at least one leg mid-step.
#[must_use]
pub fn stepping_pairs(legs: &[LegStepper; 4]) -> usize {
    DiagonalPair::ALL
        .iter()
        .filter(|pair| pair.any_moving(legs))
        .count()
}

/// Result of one coordinator tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaitTick {
    /// The pair that was offered the trigger this tick.
    pub active: DiagonalPair,
    /// Whether the active pair changed this tick.
    pub switched: bool,
    /// Legs that started a step this tick, indexed by [`LegId::index`].
    pub started: [bool; 4],
}

impl GaitTick {
    #[must_use]
    pub const fn started(&self, leg: LegId) -> bool {
        self.started[leg.index()]
    }

    #[must_use]
    pub fn any_started(&self) -> bool {
        self.started.iter().any(|s| *s)
    }
}

/// Alternates the step trigger between the two diagonal pairs.
#[derive(Debug, Clone)]
pub struct GaitCoordinator {
    active: DiagonalPair,
    offered: bool,
    switches: u64,
}

impl Default for GaitCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl GaitCoordinator {
    /// Start with front-left/back-right as the first pair offered.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_with(DiagonalPair::LeftLead)
    }

    #[must_use]
    pub const fn starting_with(pair: DiagonalPair) -> Self {
        Self {
            active: pair,
            offered: false,
            switches: 0,
        }
    }

    /// The pair currently holding the trigger.
    pub const fn active(&self) -> DiagonalPair {
        self.active
    }

    /// Number of hand-overs so far.
    pub const fn switches(&self) -> u64 {
        self.switches
    }

    /// Offer the step trigger for this tick.
    ///
    /// If the active pair has already been offered and neither member is
    /// moving, the other pair takes over first. Both members of the active
    /// pair are then offered [`LegStepper::try_move`], so a leg that lagged
    /// behind its partner can still join the step.
    pub fn tick(&mut self, legs: &mut [LegStepper; 4], up: &Vector3<f32>) -> GaitTick {
        let mut switched = false;
        if self.offered && !self.active.any_moving(legs) {
            self.active = self.active.other();
            self.switches += 1;
            switched = true;
            trace!(pair = ?self.active, "gait pair switch");
        }

        let mut started = [false; 4];
        for leg in self.active.legs() {
            started[leg.index()] = legs[leg.index()].try_move(up);
        }
        self.offered = true;

        GaitTick {
            active: self.active,
            switched,
            started,
        }
    }

    /// Return to the initial pair without an outstanding offer.
    pub fn reset(&mut self) {
        *self = Self::starting_with(DiagonalPair::LeftLead);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
