//! Position history trails that follow a moving owner.
//!
//! A trail records its owner's position into a fixed-capacity ring. The
//! history fills on every step, then throttles to one sample per cadence.
//! Rendering appends the owner's live position so the line always reaches the
//! mover, and once the ring is full the oldest point slides toward the next
//! one as the cadence elapses so the tail does not jump on eviction.

use glam::Vec3;
use sparkykit_platform::{ColorGradient, LinePrimitive, Transform};
use tracing::{debug, info};

use crate::config::TrailConfig;
use crate::curve::Spline;

/// Fixed-capacity ring of recorded positions, oldest first.
#[derive(Debug, Clone)]
pub struct TrailHistory {
    slots: Vec<Vec3>,
    front: usize,
    count: usize,
    last_sample_time: f32,
}

impl TrailHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Vec3::ZERO; capacity],
            front: 0,
            count: 0,
            last_sample_time: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    pub fn last_sample_time(&self) -> f32 {
        self.last_sample_time
    }

    /// Records `position` at `now`, evicting the oldest sample when full.
    pub fn push(&mut self, position: Vec3, now: f32) {
        self.last_sample_time = now;
        let capacity = self.capacity();
        if capacity == 0 {
            return;
        }
        if self.count < capacity {
            let back = (self.front + self.count) % capacity;
            self.slots[back] = position;
            self.count += 1;
        } else {
            self.slots[self.front] = position;
            self.front = (self.front + 1) % capacity;
        }
    }

    pub fn clear(&mut self) {
        self.front = 0;
        self.count = 0;
    }

    /// Sample `i`, counting from the oldest.
    pub fn get(&self, i: usize) -> Option<Vec3> {
        (i < self.count).then(|| self.slots[(self.front + i) % self.capacity()])
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.count).map(move |i| self.slots[(self.front + i) % self.capacity()])
    }

    /// Moves every recorded point by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        let capacity = self.capacity();
        for i in 0..self.count {
            self.slots[(self.front + i) % capacity] += offset;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrailPhase {
    Recording,
    FadingOut { opacity: f32 },
    Dead,
}

#[derive(Debug, Clone)]
pub struct TrailBuffer {
    config: TrailConfig,
    history: TrailHistory,
    position: Vec3,
    phase: TrailPhase,
    fade_gradient: Option<ColorGradient>,
}

impl TrailBuffer {
    /// A trail seeded with one sample at `position`.
    pub fn new(config: TrailConfig, position: Vec3, now: f32) -> Self {
        let mut history = TrailHistory::new(config.point_capacity);
        history.push(position, now);
        Self {
            config,
            history,
            position,
            phase: TrailPhase::Recording,
            fade_gradient: None,
        }
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn history(&self) -> &TrailHistory {
        &self.history
    }

    pub fn phase(&self) -> TrailPhase {
        self.phase
    }

    /// The live endpoint of the trail.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Drops the history and starts over at `position`.
    pub fn reset(&mut self, position: Vec3, now: f32) {
        self.position = position;
        self.history.clear();
        self.history.push(position, now);
    }

    /// Records `position` unless the history is full and the cadence has not elapsed.
    pub fn sample(&mut self, position: Vec3, now: f32) -> bool {
        let due = now - self.history.last_sample_time() >= self.config.cadence;
        if !self.history.is_full() || due {
            self.history.push(position, now);
            true
        } else {
            false
        }
    }

    /// Fraction of the current cadence interval that has elapsed, in `[0, 1]`.
    pub fn sample_fraction(&self, now: f32) -> f32 {
        if self.config.cadence <= 0.0 {
            return 1.0;
        }
        ((now - self.history.last_sample_time()) / self.config.cadence).clamp(0.0, 1.0)
    }

    /// Recorded points oldest first, followed by the live position.
    ///
    /// Always at least two points.
    pub fn render_points(&self, now: f32) -> Vec<Vec3> {
        if self.history.is_empty() {
            return vec![self.position, self.position];
        }

        let mut points = Vec::with_capacity(self.history.len() + 1);
        points.extend(self.history.iter());
        if self.history.is_full() {
            if let Some(second) = self.history.get(1) {
                let pct = self.sample_fraction(now);
                points[0] = points[0].lerp(second, pct);
            }
        }
        points.push(self.position);
        points
    }

    /// [`Self::render_points`], resampled through a spline when smoothing is enabled.
    pub fn smoothed_points(&self, now: f32) -> Vec<Vec3> {
        let points = self.render_points(now);
        if self.config.spline_precision <= 1 {
            return points;
        }
        let count = self.config.spline_precision * points.len() + 1;
        Spline::with_tension(points, self.config.spline_tension).sample_uniform(count)
    }

    /// Advances one frame and redraws `line`.
    ///
    /// `owner` is the transform being followed, or `None` once it is gone.
    /// Losing the owner starts an irreversible fade that ends in [`TrailPhase::Dead`].
    pub fn step<L: LinePrimitive + ?Sized>(
        &mut self,
        owner: Option<&Transform>,
        now: f32,
        dt: f32,
        line: &mut L,
    ) -> TrailPhase {
        if self.phase == TrailPhase::Dead {
            return self.phase;
        }

        if let (TrailPhase::Recording, Some(owner)) = (self.phase, owner) {
            self.position = owner.position;
            if self.config.idle_speed != 0.0 {
                let drift = owner.forward().normalize_or_zero() * self.config.idle_speed;
                self.history.translate(drift);
            }
        }

        line.set_positions(&self.smoothed_points(now));
        // a lone sample has nothing behind the mover yet
        line.set_visible(self.history.len() > 1);
        self.sample(self.position, now);

        if owner.is_none() && self.phase == TrailPhase::Recording {
            info!(position = ?self.position, "trail owner gone, fading out");
            self.fade_gradient = Some(line.gradient().clone());
            self.phase = TrailPhase::FadingOut { opacity: 1.0 };
        }

        if let TrailPhase::FadingOut { opacity } = self.phase {
            if let Some(gradient) = &self.fade_gradient {
                line.set_gradient(gradient.scaled_alpha(opacity.max(0.0)));
            }
            let remaining = if self.config.fade_time > 0.0 {
                opacity - dt / self.config.fade_time
            } else {
                0.0
            };
            self.phase = if remaining <= 0.0 {
                debug!("trail faded out");
                TrailPhase::Dead
            } else {
                TrailPhase::FadingOut { opacity: remaining }
            };
        }

        self.phase
    }
}
