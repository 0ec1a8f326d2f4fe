//! Entity arena driving emitters, sparks and trails one frame at a time.
//!
//! Entities are addressed by generational [`EntityId`] handles. Parenting is
//! by value: each step a child copies its parent's transform, and a trail
//! whose parent is gone fades out and removes itself.

use serde::{Deserialize, Serialize};
use sparkykit_platform::{EffectHost, LinePrimitive, Transform};
use tracing::{debug, error, warn};

use crate::config::{EmitterConfig, TrailConfig};
use crate::emitter::{EmissionScheduler, SparkLaunch};
use crate::error::EffectError;
use crate::random::{RngSampler, UniformSampler};
use crate::spark::{Spark, SparkPhase};
use crate::style::LineStyle;
use crate::trail::{TrailBuffer, TrailPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Anchor,
    Emitter,
    Spark,
    Trail,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStats {
    pub anchors: usize,
    pub emitters: usize,
    pub sparks: usize,
    pub trails: usize,
}

struct EmitterRecord {
    scheduler: EmissionScheduler,
    templates: Vec<LineStyle>,
}

enum Body<L> {
    Anchor,
    Emitter(EmitterRecord),
    Spark { spark: Spark, line: L },
    Trail { trail: TrailBuffer, line: L },
}

struct Entity<L> {
    transform: Transform,
    parent: Option<EntityId>,
    enabled: bool,
    body: Body<L>,
}

impl<L> Entity<L> {
    fn kind(&self) -> EntityKind {
        match self.body {
            Body::Anchor => EntityKind::Anchor,
            Body::Emitter(_) => EntityKind::Emitter,
            Body::Spark { .. } => EntityKind::Spark,
            Body::Trail { .. } => EntityKind::Trail,
        }
    }

    fn line(&self) -> Option<&L> {
        match &self.body {
            Body::Spark { line, .. } | Body::Trail { line, .. } => Some(line),
            _ => None,
        }
    }
}

struct Slot<L> {
    generation: u32,
    entity: Option<Entity<L>>,
}

pub struct Scene<H: EffectHost, S = RngSampler<rand::rngs::StdRng>> {
    host: H,
    sampler: S,
    slots: Vec<Slot<H::Line>>,
    free: Vec<u32>,
    time: f32,
}

impl<H: EffectHost> Scene<H> {
    /// Scene with an OS-seeded random source.
    pub fn with_host(host: H) -> Self {
        Self::new(host, RngSampler::from_entropy())
    }
}

impl<H: EffectHost, S: UniformSampler> Scene<H, S> {
    pub fn new(host: H, sampler: S) -> Self {
        Self {
            host,
            sampler,
            slots: Vec::new(),
            free: Vec::new(),
            time: 0.0,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn entity(&self, id: EntityId) -> Option<&Entity<H::Line>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity<H::Line>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    fn insert(&mut self, entity: Entity<H::Line>) -> EntityId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entity = Some(entity);
                EntityId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entity: Some(entity),
                });
                EntityId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        debug!(?id, "entity spawned");
        id
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entity(id).map(Entity::kind)
    }

    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        self.entity(id).map(|entity| entity.transform)
    }

    pub fn line(&self, id: EntityId) -> Option<&H::Line> {
        self.entity(id).and_then(Entity::line)
    }

    pub fn spark(&self, id: EntityId) -> Option<&Spark> {
        match &self.entity(id)?.body {
            Body::Spark { spark, .. } => Some(spark),
            _ => None,
        }
    }

    pub fn trail(&self, id: EntityId) -> Option<&TrailBuffer> {
        match &self.entity(id)?.body {
            Body::Trail { trail, .. } => Some(trail),
            _ => None,
        }
    }

    pub fn emitter(&self, id: EntityId) -> Option<&EmissionScheduler> {
        match &self.entity(id)?.body {
            Body::Emitter(record) => Some(&record.scheduler),
            _ => None,
        }
    }

    /// Every live line, sparks and trails alike.
    pub fn lines(&self) -> impl Iterator<Item = (EntityId, &H::Line)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let line = slot.entity.as_ref()?.line()?;
            let id = EntityId {
                index: index as u32,
                generation: slot.generation,
            };
            Some((id, line))
        })
    }

    pub fn stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        for entity in self.slots.iter().filter_map(|slot| slot.entity.as_ref()) {
            match entity.kind() {
                EntityKind::Anchor => stats.anchors += 1,
                EntityKind::Emitter => stats.emitters += 1,
                EntityKind::Spark => stats.sparks += 1,
                EntityKind::Trail => stats.trails += 1,
            }
        }
        stats
    }

    /// A bare transform the host moves around, for trails and emitters to follow.
    pub fn spawn_anchor(&mut self, transform: Transform) -> EntityId {
        self.insert(Entity {
            transform,
            parent: None,
            enabled: true,
            body: Body::Anchor,
        })
    }

    pub fn spawn_emitter(
        &mut self,
        config: EmitterConfig,
        templates: Vec<LineStyle>,
        transform: Transform,
    ) -> Result<EntityId, EffectError> {
        config.validate()?;
        let scheduler = EmissionScheduler::new(config, self.time);
        Ok(self.insert(Entity {
            transform,
            parent: None,
            enabled: true,
            body: Body::Emitter(EmitterRecord {
                scheduler,
                templates,
            }),
        }))
    }

    /// Starts a trail at `parent`'s position, or at `transform` when there is no live parent.
    pub fn spawn_trail(
        &mut self,
        config: TrailConfig,
        style: &LineStyle,
        transform: Transform,
        parent: Option<EntityId>,
    ) -> Result<EntityId, EffectError> {
        config.validate()?;
        let transform = parent
            .and_then(|parent| self.transform(parent))
            .unwrap_or(transform);
        let mut line = self.create_line(style)?;
        let trail = TrailBuffer::new(config, transform.position, self.time);
        line.set_positions(&trail.render_points(self.time));
        line.set_visible(false);
        Ok(self.insert(Entity {
            transform,
            parent,
            enabled: true,
            body: Body::Trail { trail, line },
        }))
    }

    fn spawn_spark(&mut self, style: &LineStyle, launch: SparkLaunch) -> Result<EntityId, EffectError> {
        let mut line = self.create_line(style)?;
        let spark = Spark::new(launch.transform.position, launch.params);
        spark.draw(&mut line);
        Ok(self.insert(Entity {
            transform: launch.transform,
            parent: None,
            enabled: true,
            body: Body::Spark { spark, line },
        }))
    }

    fn create_line(&mut self, style: &LineStyle) -> Result<H::Line, EffectError> {
        let mut line = self
            .host
            .create_line()
            .map_err(|err| EffectError::Host(err.to_string()))?;
        if let Err(err) = style.apply(&mut line) {
            self.host.release_line(line);
            return Err(err);
        }
        Ok(line)
    }

    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> Result<(), EffectError> {
        let entity = self.entity_mut(id).ok_or(EffectError::UnknownEntity(id))?;
        entity.transform = transform;
        if let Body::Trail { trail, .. } = &mut entity.body {
            trail.set_position(transform.position);
        }
        Ok(())
    }

    /// Attaches `id` to `parent`, or detaches it with `None`. Detaching a trail starts its fade.
    pub fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), EffectError> {
        if let Some(parent) = parent {
            if !self.is_alive(parent) {
                return Err(EffectError::UnknownEntity(parent));
            }
        }
        let entity = self.entity_mut(id).ok_or(EffectError::UnknownEntity(id))?;
        entity.parent = parent;
        Ok(())
    }

    /// Disabled entities are not stepped. Re-enabling a trail restarts it at its parent.
    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Result<(), EffectError> {
        let now = self.time;
        let parent = self.entity(id).ok_or(EffectError::UnknownEntity(id))?.parent;
        let parent_transform = parent.and_then(|parent| self.transform(parent));
        let entity = self.entity_mut(id).ok_or(EffectError::UnknownEntity(id))?;
        let was_enabled = std::mem::replace(&mut entity.enabled, enabled);
        if let (false, true, Some(owner), Body::Trail { trail, .. }) =
            (was_enabled, enabled, parent_transform, &mut entity.body)
        {
            trail.reset(owner.position, now);
            entity.transform = owner;
        }
        Ok(())
    }

    /// Removes `id` and hands its line back to the host. Returns `false` for stale handles.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return false;
        };
        let Some(entity) = slot.entity.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        match entity.body {
            Body::Spark { line, .. } | Body::Trail { line, .. } => self.host.release_line(line),
            Body::Anchor | Body::Emitter(_) => {}
        }
        debug!(?id, "entity destroyed");
        true
    }

    /// Advances every enabled entity by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.time += dt;
        let now = self.time;

        let owners: Vec<Option<Transform>> = self
            .slots
            .iter()
            .map(|slot| {
                let parent = slot.entity.as_ref()?.parent?;
                self.transform(parent)
            })
            .collect();

        let mut launches: Vec<(LineStyle, SparkLaunch)> = Vec::new();
        let mut dead = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(entity) = slot.entity.as_mut() else {
                continue;
            };
            if !entity.enabled {
                continue;
            }
            let id = EntityId {
                index: index as u32,
                generation: slot.generation,
            };
            let owner = owners[index];

            match &mut entity.body {
                Body::Anchor => {
                    if let Some(owner) = owner {
                        entity.transform = owner;
                    }
                }
                Body::Emitter(record) => {
                    if let Some(owner) = owner {
                        entity.transform = owner;
                    }
                    match record.scheduler.step(
                        now,
                        &entity.transform,
                        record.templates.len(),
                        &mut self.sampler,
                    ) {
                        Ok(batch) => launches.extend(batch.into_iter().filter_map(|launch| {
                            let style = record.templates.get(launch.template)?.clone();
                            Some((style, launch))
                        })),
                        Err(err) => {
                            error!(?id, %err, "destroying spark emitter");
                            dead.push(id);
                        }
                    }
                }
                Body::Spark { spark, line } => {
                    let phase = spark.step(dt);
                    entity.transform.position = spark.position();
                    spark.draw(line);
                    if phase == SparkPhase::Dead {
                        dead.push(id);
                    }
                }
                Body::Trail { trail, line } => {
                    let phase = trail.step(owner.as_ref(), now, dt, line);
                    entity.transform.position = trail.position();
                    if phase == TrailPhase::Dead {
                        dead.push(id);
                    }
                }
            }
        }

        for id in dead {
            self.destroy(id);
        }

        for (style, launch) in launches {
            if let Err(err) = self.spawn_spark(&style, launch) {
                warn!(%err, "spark not spawned");
            }
        }
    }
}

impl<H: EffectHost, S> std::fmt::Debug for Scene<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let live = self.slots.iter().filter(|slot| slot.entity.is_some()).count();
        f.debug_struct("Scene")
            .field("time", &self.time)
            .field("entities", &live)
            .finish()
    }
}
