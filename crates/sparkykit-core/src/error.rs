use thiserror::Error;

use crate::scene::EntityId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("tangent point index {index} out of range for {len} control points")]
    TangentIndexOutOfRange { index: isize, len: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension {0:?}")]
    UnsupportedFormat(String),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("spark emitter has no spark templates")]
    NoSparkTemplates,
    #[error("no material provided for line style")]
    MissingMaterial,
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    #[error("host failed to create line primitive: {0}")]
    Host(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_error_mentions_index_and_len() {
        let msg = CurveError::TangentIndexOutOfRange { index: 7, len: 3 }.to_string();
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn invalid_config_names_field() {
        let msg = ConfigError::invalid("point_capacity", "must be at most 32").to_string();
        assert!(msg.contains("point_capacity"));
        assert!(msg.contains("at most 32"));
    }
}
