//! Boost timers.
//!
//! A vehicle can hold several boost sources at once (a released mini-turbo
//! while driving over a boost panel, say). Each source is a countdown timer;
//! while any timer is live the movement stage swaps its speed target and
//! acceleration for the strongest active source's values.

use bevy::prelude::*;

/// Boost sources, in increasing order of strength.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostKind {
    /// Mini-turbo family (drift release, start boost).
    AllMt,
    /// Mushroom items and boost panels.
    MushroomAndBoostPanel,
}

impl BoostKind {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            BoostKind::AllMt => 0,
            BoostKind::MushroomAndBoostPanel => 1,
        }
    }

    /// Forward acceleration while this boost is active, per frame.
    pub fn acceleration(self) -> f32 {
        match self {
            BoostKind::AllMt => 3.0,
            BoostKind::MushroomAndBoostPanel => 7.0,
        }
    }

    /// Multiplier applied to the base speed target while active.
    pub fn multiplier(self) -> f32 {
        match self {
            BoostKind::AllMt => 1.2,
            BoostKind::MushroomAndBoostPanel => 1.3,
        }
    }
}

/// Active boost timers for one vehicle.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct KartBoost {
    timers: [u16; BoostKind::COUNT],
}

impl KartBoost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or extend) a boost of the given kind.
    ///
    /// A fresh activation never shortens a longer boost already running from
    /// the same source.
    pub fn activate(&mut self, kind: BoostKind, frames: u16) {
        let timer = &mut self.timers[kind.index()];
        *timer = (*timer).max(frames);
    }

    /// Tick all timers by one frame. Returns whether any boost is live.
    pub fn calc(&mut self) -> bool {
        let mut any = false;
        for timer in &mut self.timers {
            if *timer > 0 {
                *timer -= 1;
                any = true;
            }
        }
        any
    }

    /// The strongest boost source currently live, if any.
    pub fn active_kind(&self) -> Option<BoostKind> {
        if self.timers[BoostKind::MushroomAndBoostPanel.index()] > 0 {
            Some(BoostKind::MushroomAndBoostPanel)
        } else if self.timers[BoostKind::AllMt.index()] > 0 {
            Some(BoostKind::AllMt)
        } else {
            None
        }
    }

    /// Forward acceleration of the strongest live boost, if any.
    pub fn acceleration(&self) -> Option<f32> {
        self.active_kind().map(BoostKind::acceleration)
    }

    /// Speed target multiplier of the strongest live boost (1.0 when idle).
    pub fn multiplier(&self) -> f32 {
        self.active_kind().map_or(1.0, BoostKind::multiplier)
    }

    /// Frames remaining on the given boost kind.
    pub fn remaining(&self, kind: BoostKind) -> u16 {
        self.timers[kind.index()]
    }

    /// Drop all boosts immediately.
    pub fn reset(&mut self) {
        self.timers = [0; BoostKind::COUNT];
    }
}
