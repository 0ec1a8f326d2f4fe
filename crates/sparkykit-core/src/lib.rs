//! SparkyKit core engine: host-agnostic spark emission, particle trails and
//! spline evaluation, stepped once per frame.

pub mod config;
pub mod curve;
pub mod emitter;
pub mod error;
pub mod random;
pub mod scene;
pub mod spark;
pub mod style;
pub mod trail;

pub use config::{EffectsConfig, EmitterConfig, FloatRange, TrailConfig};
pub use curve::{hermite_blend, Spline};
pub use emitter::{EmissionScheduler, SparkLaunch};
pub use error::{ConfigError, CurveError, EffectError};
pub use random::{MidpointSampler, RngSampler, UniformSampler};
pub use scene::{EntityId, EntityKind, Scene, SceneStats};
pub use spark::{Spark, SparkParams, SparkPhase};
pub use style::{HeadlessHost, LineStyle, LineVertex, Polyline};
pub use trail::{TrailBuffer, TrailHistory, TrailPhase};
