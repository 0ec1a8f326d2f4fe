//! Decides when sparks are emitted and with which launch parameters.

use glam::Quat;
use sparkykit_platform::Transform;
use tracing::{debug, info};

use crate::config::EmitterConfig;
use crate::error::EffectError;
use crate::random::UniformSampler;
use crate::spark::SparkParams;

/// One spark to instantiate.
#[derive(Debug, Clone, PartialEq)]
pub struct SparkLaunch {
    /// Index into the emitter's template list.
    pub template: usize,
    pub transform: Transform,
    pub params: SparkParams,
}

#[derive(Debug, Clone)]
pub struct EmissionScheduler {
    config: EmitterConfig,
    start_time: f32,
    next_emission_time: f32,
    enabled: bool,
}

impl EmissionScheduler {
    pub fn new(config: EmitterConfig, now: f32) -> Self {
        Self {
            config,
            start_time: now,
            next_emission_time: now,
            enabled: true,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn next_emission_time(&self) -> f32 {
        self.next_emission_time
    }

    /// Emits whatever is due at `now` from `owner`.
    ///
    /// Fails when sparks are due but there is no template to draw them with.
    /// Once the emitter lifetime has passed the scheduler disables itself.
    pub fn step(
        &mut self,
        now: f32,
        owner: &Transform,
        template_count: usize,
        sampler: &mut impl UniformSampler,
    ) -> Result<Vec<SparkLaunch>, EffectError> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let launches = self.process_emission(now, owner, template_count, sampler)?;

        if self.config.lifetime > 0.0 && now > self.start_time + self.config.lifetime {
            info!(lifetime = self.config.lifetime, "spark emitter expired");
            self.enabled = false;
        }
        Ok(launches)
    }

    fn process_emission(
        &mut self,
        now: f32,
        owner: &Transform,
        template_count: usize,
        sampler: &mut impl UniformSampler,
    ) -> Result<Vec<SparkLaunch>, EffectError> {
        if now < self.next_emission_time {
            return Ok(Vec::new());
        }
        if template_count == 0 {
            self.enabled = false;
            return Err(EffectError::NoSparkTemplates);
        }

        let count = self.config.simultaneous_emissions.sample(sampler).floor().max(0.0) as usize;
        let mut launches = Vec::with_capacity(count);
        for _ in 0..count {
            launches.push(self.launch(owner, template_count, sampler));
        }

        self.next_emission_time = now + self.config.delay.sample(sampler);
        debug!(count, next = self.next_emission_time, "sparks emitted");
        Ok(launches)
    }

    fn launch(
        &self,
        owner: &Transform,
        template_count: usize,
        sampler: &mut impl UniformSampler,
    ) -> SparkLaunch {
        let half_angle = self.config.emission_angle * 0.5;
        let angle = sampler.uniform(-half_angle, half_angle);
        let direction = (Quat::from_rotation_z(angle.to_radians()) * owner.right()).truncate();

        let template = sampler.index(template_count);
        let speed = self.config.start_speed.sample(sampler);
        let params = SparkParams {
            velocity: direction * speed,
            lifetime: self.config.spark_lifetime.sample(sampler),
            acceleration: self.config.acceleration,
            drag: self.config.drag,
            appear_time: self.config.appear_time.sample(sampler),
            disappear_time: self.config.disappear_time.sample(sampler),
            length_scale: self.config.length_multiplier,
        };

        SparkLaunch {
            template,
            transform: *owner,
            params,
        }
    }
}
