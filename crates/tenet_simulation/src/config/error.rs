//! Ошибки конфигурации (fail fast до старта сессии).

use thiserror::Error;

/// Configuration error: ловится при загрузке, в runtime не восстанавливается.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("difficulty table is empty")]
    EmptyDifficultyTable,

    #[error("difficulty '{difficulty}': field '{field}' has invalid value {value}")]
    InvalidValue {
        difficulty: String,
        field: &'static str,
        value: f32,
    },

    #[error("difficulty '{difficulty}': range for weapon '{weapon}' has min {min} > max {max}")]
    InvalidRange {
        difficulty: String,
        weapon: String,
        min: i32,
        max: i32,
    },

    #[error("rebuild base duration must be positive, got {0}")]
    InvalidBaseDuration(f32),

    #[error("rebuild target duration must be positive, got {0}")]
    InvalidTargetDuration(f32),

    #[error("keyframe {index}: {field} = {value} is outside [0, 1]")]
    KeyframeOutOfRange {
        index: usize,
        field: &'static str,
        value: f32,
    },

    #[error("keyframe {index}: speed must be positive, got {speed}")]
    KeyframeSpeed { index: usize, speed: f32 },

    #[error("keyframe {index} starts at {start} before previous keyframe ends at {cursor}")]
    KeyframeOverlap { index: usize, start: f32, cursor: f32 },

    #[error("failed to parse difficulty table: {0}")]
    Parse(#[from] toml::de::Error),
}
