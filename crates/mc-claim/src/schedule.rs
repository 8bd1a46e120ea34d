//! Emitter-side throttle: when to claim, and how far.
//!
//! Emitters don't claim every tick. Each one runs every `interval` ticks plus
//! a stagger derived from its position, so neighbors spread their work across
//! ticks. While active, the radius grows by one every `expansion_rate` ticks.

use tracing::debug;

use crate::config::ClaimConfig;
use crate::pos::EmitterPos;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitterSchedule {
    emitter: EmitterPos,
    initial_radius: u32,
    max_radius: Option<u32>,
    expansion_rate: u32,
    run_every: u32,
    radius: u32,
    active: bool,
    active_ticks: u64,
    since_run: u32,
}

impl EmitterSchedule {
    /// Inactive schedule for `emitter`.
    #[must_use]
    pub fn new(emitter: EmitterPos, config: &ClaimConfig) -> Self {
        let interval = config.interval.max(1);
        Self {
            emitter,
            initial_radius: config.initial_radius,
            max_radius: config.max_radius,
            expansion_rate: config.expansion_rate.max(1),
            run_every: interval + stagger(emitter, interval),
            radius: config.initial_radius,
            active: false,
            active_ticks: 0,
            since_run: 0,
        }
    }

    /// Start from the initial radius.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.active_ticks = 0;
        self.radius = self.initial_radius;
        debug!("Activating {} with initial radius {}", self.emitter, self.radius);
    }

    /// Stop and fall back to the initial radius. The caller releases the zone.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.active_ticks = 0;
        self.radius = self.initial_radius;
        debug!("Deactivating {}", self.emitter);
    }

    /// Advance one game tick. Returns `true` when a claim run is due.
    pub fn tick(&mut self) -> bool {
        self.since_run = self.since_run.saturating_add(1);

        if !self.active {
            return false;
        }

        self.active_ticks += 1;
        if self.active_ticks % u64::from(self.expansion_rate) == 0 {
            self.grow();
        }

        if self.since_run < self.run_every {
            return false;
        }
        self.since_run = 0;
        true
    }

    fn grow(&mut self) {
        if self.max_radius.is_some_and(|max| self.radius >= max) {
            return;
        }
        self.radius += 1;
        debug!("Expanding radius to {} at {}", self.radius, self.emitter);
    }

    #[must_use]
    pub fn emitter(&self) -> EmitterPos {
        self.emitter
    }

    #[must_use]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ticks between claim runs for this emitter.
    #[must_use]
    pub fn run_every(&self) -> u32 {
        self.run_every
    }
}

/// Position-derived offset in `0..interval`.
#[must_use]
pub fn stagger(emitter: EmitterPos, interval: u32) -> u32 {
    let pos = emitter.pos();
    let hash = i64::from(pos.x) * 73 + i64::from(pos.y) * 179 + i64::from(pos.z) * 283;
    (hash % i64::from(interval.max(1))).unsigned_abs() as u32
}
