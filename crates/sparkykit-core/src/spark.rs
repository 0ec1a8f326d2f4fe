//! Single spark physics and its appear/disappear size ramp.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use sparkykit_platform::LinePrimitive;

/// Launch parameters drawn by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparkParams {
    pub velocity: Vec2,
    pub lifetime: f32,
    pub acceleration: Vec2,
    pub drag: f32,
    pub appear_time: f32,
    pub disappear_time: f32,
    /// Line length per unit of velocity.
    pub length_scale: f32,
}

impl Default for SparkParams {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            lifetime: 0.0,
            acceleration: Vec2::ZERO,
            drag: 0.0,
            appear_time: 0.0,
            disappear_time: 0.0,
            length_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparkPhase {
    Growing,
    Steady,
    Shrinking,
    Dead,
}

#[derive(Debug, Clone)]
pub struct Spark {
    position: Vec3,
    velocity: Vec2,
    acceleration: Vec2,
    drag: f32,
    lifetime: f32,
    size: f32,
    appear_time: f32,
    disappear_time: f32,
    length_scale: f32,
    dead: bool,
    endpoints: [Vec3; 2],
}

impl Spark {
    pub fn new(position: Vec3, params: SparkParams) -> Self {
        let mut spark = Self {
            position,
            velocity: params.velocity,
            acceleration: params.acceleration,
            drag: params.drag,
            lifetime: params.lifetime,
            size: if params.appear_time <= 0.0 { 1.0 } else { 0.0 },
            appear_time: params.appear_time,
            disappear_time: params.disappear_time,
            length_scale: params.length_scale,
            dead: false,
            endpoints: [position; 2],
        };
        spark.endpoints = spark.segment();
        spark
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    pub fn phase(&self) -> SparkPhase {
        if self.dead {
            SparkPhase::Dead
        } else if self.lifetime <= 0.0 {
            SparkPhase::Shrinking
        } else if self.size < 1.0 {
            SparkPhase::Growing
        } else {
            SparkPhase::Steady
        }
    }

    /// Tail and tip for the current state.
    ///
    /// Live sparks grow out of their position. A shrinking spark keeps its tip
    /// fixed and pulls the tail in toward it.
    pub fn segment(&self) -> [Vec3; 2] {
        let reach = (self.velocity * self.length_scale).extend(0.0);
        if self.lifetime <= 0.0 {
            let tip = self.position + reach;
            [tip.lerp(self.position, self.size), tip]
        } else {
            [self.position, self.position + reach * self.size]
        }
    }

    /// Tail and tip computed during the last step.
    pub fn endpoints(&self) -> [Vec3; 2] {
        self.endpoints
    }

    pub fn step(&mut self, dt: f32) -> SparkPhase {
        if self.dead {
            return SparkPhase::Dead;
        }

        self.lifetime -= dt;
        self.position += (self.velocity * dt).extend(0.0);
        self.endpoints = self.segment();

        let drag = (self.drag * dt).min(1.0);
        self.velocity = self.velocity * (1.0 - drag) + self.acceleration * dt;

        if self.lifetime <= 0.0 {
            if self.disappear_time <= 0.0 {
                self.dead = true;
            } else {
                self.size = (self.size - dt / self.disappear_time).max(0.0);
                self.dead = self.size <= 0.0;
            }
        } else if self.size < 1.0 {
            self.size = if self.appear_time <= 0.0 {
                1.0
            } else {
                (self.size + dt / self.appear_time).min(1.0)
            };
        }

        self.phase()
    }

    pub fn draw<L: LinePrimitive + ?Sized>(&self, line: &mut L) {
        line.set_positions(&self.endpoints);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn scenario() -> Spark {
        Spark::new(
            Vec3::ZERO,
            SparkParams {
                velocity: Vec2::X,
                lifetime: 1.0,
                appear_time: 0.2,
                disappear_time: 0.4,
                length_scale: 1.0,
                ..SparkParams::default()
            },
        )
    }

    #[test]
    fn zero_appear_time_starts_full_size() {
        let spark = Spark::new(
            Vec3::ZERO,
            SparkParams {
                velocity: Vec2::X,
                lifetime: 1.0,
                ..SparkParams::default()
            },
        );
        assert_eq!(spark.size(), 1.0);
        assert_eq!(spark.phase(), SparkPhase::Steady);
    }

    #[test]
    fn grows_during_appear_phase() {
        let mut spark = scenario();
        assert_eq!(spark.phase(), SparkPhase::Growing);
        spark.step(0.1);
        assert!((spark.size() - 0.5).abs() < EPS);
        let [tail, tip] = spark.segment();
        assert_eq!(tail, spark.position());
        assert!(tip.abs_diff_eq(spark.position() + Vec3::new(0.5, 0.0, 0.0), EPS));
        spark.step(0.1);
        assert_eq!(spark.phase(), SparkPhase::Steady);
    }

    #[test]
    fn endpoints_use_pre_update_size() {
        let mut spark = scenario();
        spark.step(0.1);
        let [tail, tip] = spark.endpoints();
        assert_eq!(tail, tip);
    }

    #[test]
    fn moves_with_velocity() {
        let mut spark = scenario();
        spark.step(0.25);
        assert!(spark.position().abs_diff_eq(Vec3::new(0.25, 0.0, 0.0), EPS));
    }

    #[test]
    fn drag_and_acceleration_apply_after_moving() {
        let mut spark = Spark::new(
            Vec3::ZERO,
            SparkParams {
                velocity: Vec2::new(2.0, 0.0),
                lifetime: 1.0,
                acceleration: Vec2::new(0.0, -10.0),
                drag: 1.0,
                ..SparkParams::default()
            },
        );
        spark.step(0.5);
        assert!(spark.position().abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), EPS));
        assert!(spark.velocity().abs_diff_eq(Vec2::new(1.0, -5.0), EPS));
    }

    #[test]
    fn drag_factor_saturates() {
        let mut spark = Spark::new(
            Vec3::ZERO,
            SparkParams {
                velocity: Vec2::new(3.0, 0.0),
                lifetime: 1.0,
                drag: 50.0,
                ..SparkParams::default()
            },
        );
        spark.step(0.1);
        assert_eq!(spark.velocity(), Vec2::ZERO);
    }

    #[test]
    fn shrinking_spark_is_tip_anchored() {
        let mut spark = scenario();
        let mut t = 0.0;
        while t < 1.05 {
            spark.step(0.05);
            t += 0.05;
        }
        assert_eq!(spark.phase(), SparkPhase::Shrinking);
        let size = spark.size();
        assert!(size > 0.0 && size < 1.0);

        let [tail, tip] = spark.segment();
        let position = spark.position();
        assert!(tip.abs_diff_eq(position + Vec3::X, EPS));
        assert!(tail.abs_diff_eq(tip.lerp(position, size), EPS));
    }

    #[test]
    fn shrinking_ends_in_death() {
        let mut spark = scenario();
        let mut elapsed = 0.0;
        let mut previous = spark.size();
        let mut seen_shrinking = false;
        while spark.step(0.05) != SparkPhase::Dead {
            elapsed += 0.05;
            if spark.phase() == SparkPhase::Shrinking {
                seen_shrinking = true;
                assert!(spark.size() <= previous);
            }
            previous = spark.size();
            assert!(elapsed < 2.0, "spark never died");
        }
        assert!(seen_shrinking);
        assert!(elapsed >= 1.3);
        assert_eq!(spark.step(0.05), SparkPhase::Dead);
    }

    #[test]
    fn zero_disappear_time_dies_at_lifetime_end() {
        let mut spark = Spark::new(
            Vec3::ZERO,
            SparkParams {
                velocity: Vec2::X,
                lifetime: 0.1,
                ..SparkParams::default()
            },
        );
        assert_eq!(spark.step(0.05), SparkPhase::Steady);
        assert_eq!(spark.step(0.1), SparkPhase::Dead);
    }
}
