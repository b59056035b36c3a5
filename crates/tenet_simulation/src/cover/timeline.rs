//! RebuildTimeline — keyframe-ремап длительности обратной анимации
//!
//! Базовая обратная анимация длится `base_duration`. Keyframe помечает отрезок
//! нормализованного времени [start, start + duration], который играется
//! со своей скоростью: отрезок длиной L на скорости s занимает L / s секунд.
//! Промежутки до keyframe идут 1:1. Ребилд заканчивается в конце последнего
//! keyframe (без keyframes — полная базовая длительность).
//!
//! Пример: base 10s, keyframes [{0.0, 0.2, 2.0}, {0.5, 0.2, 0.5}]
//!   1s (0.2·10/2) + 3s (промежуток 0.3·10) + 4s (0.2·10/0.5) = 8s
//!
//! Если target_duration короче — все скорости умножаются на
//! `multiplier = modified / target` (пропорции отрезков сохраняются).

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Допуск сравнения нормализованного времени (authoring в инспекторе неточен)
const TIME_EPSILON: f32 = 1.0e-5;

/// Keyframe обратной анимации (authoring data)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RebuildKeyframe {
    /// Нормализованный старт ∈ [0, 1]
    pub start: f32,
    /// Нормализованная длина ∈ [0, 1]
    pub duration: f32,
    /// Множитель скорости (> 0)
    pub speed: f32,

    #[serde(skip)]
    modified_start: f32,
    #[serde(skip)]
    modified_end: f32,
}

impl RebuildKeyframe {
    pub fn new(start: f32, duration: f32, speed: f32) -> Self {
        Self {
            start,
            duration,
            speed,
            modified_start: 0.0,
            modified_end: 0.0,
        }
    }

    /// Старт на модифицированной шкале (секунды, до multiplier)
    pub fn modified_start(&self) -> f32 {
        self.modified_start
    }

    /// Конец на модифицированной шкале (секунды, до multiplier)
    pub fn modified_end(&self) -> f32 {
        self.modified_end
    }

    fn validate(&self, index: usize, cursor: f32) -> Result<(), ConfigError> {
        for (field, value) in [("start", self.start), ("duration", self.duration)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::KeyframeOutOfRange { index, field, value });
            }
        }
        let end = self.start + self.duration;
        if end > 1.0 + TIME_EPSILON {
            return Err(ConfigError::KeyframeOutOfRange {
                index,
                field: "end",
                value: end,
            });
        }
        if !(self.speed > 0.0) || !self.speed.is_finite() {
            return Err(ConfigError::KeyframeSpeed {
                index,
                speed: self.speed,
            });
        }
        if self.start + TIME_EPSILON < cursor {
            return Err(ConfigError::KeyframeOverlap {
                index,
                start: self.start,
                cursor,
            });
        }
        Ok(())
    }
}

/// Смена скорости в заданный момент (секунды от начала ребилда)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedChange {
    pub at: f32,
    pub speed: f32,
}

/// Провалидированный timeline ребилда
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildTimeline {
    base_duration: f32,
    keyframes: Vec<RebuildKeyframe>,
    modified_duration: f32,
    target_duration: Option<f32>,
    multiplier: f32,
}

impl RebuildTimeline {
    /// Посчитать модифицированную длительность; кривые keyframes — ConfigError
    pub fn new(
        base_duration: f32,
        keyframes: Vec<RebuildKeyframe>,
        target_duration: Option<f32>,
    ) -> Result<Self, ConfigError> {
        if !(base_duration > 0.0) || !base_duration.is_finite() {
            return Err(ConfigError::InvalidBaseDuration(base_duration));
        }
        if let Some(target) = target_duration {
            if !(target > 0.0) {
                return Err(ConfigError::InvalidTargetDuration(target));
            }
        }

        let mut keyframes = keyframes;
        let mut original_cursor = 0.0_f32;
        let mut modified_cursor = 0.0_f32;

        for (index, keyframe) in keyframes.iter_mut().enumerate() {
            keyframe.validate(index, original_cursor)?;

            // Промежуток до keyframe — 1:1
            modified_cursor += (keyframe.start - original_cursor).max(0.0) * base_duration;
            keyframe.modified_start = modified_cursor;

            modified_cursor += keyframe.duration * base_duration / keyframe.speed;
            keyframe.modified_end = modified_cursor;

            original_cursor = keyframe.start + keyframe.duration;
        }

        let modified_duration = if keyframes.is_empty() {
            base_duration
        } else {
            modified_cursor
        };

        let multiplier = match target_duration {
            Some(target) if target < modified_duration => modified_duration / target,
            _ => 1.0,
        };

        Ok(Self {
            base_duration,
            keyframes,
            modified_duration,
            target_duration,
            multiplier,
        })
    }

    /// Timeline без keyframes (обычная обратная анимация)
    pub fn linear(base_duration: f32) -> Result<Self, ConfigError> {
        Self::new(base_duration, Vec::new(), None)
    }

    pub fn base_duration(&self) -> f32 {
        self.base_duration
    }

    pub fn keyframes(&self) -> &[RebuildKeyframe] {
        &self.keyframes
    }

    /// Длительность после keyframe-ремапа (до multiplier)
    pub fn modified_duration(&self) -> f32 {
        self.modified_duration
    }

    pub fn target_duration(&self) -> Option<f32> {
        self.target_duration
    }

    /// Глобальный множитель скорости (≥ 1)
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Реальное время ребилда (секунды)
    pub fn total_duration(&self) -> f32 {
        self.modified_duration / self.multiplier
    }

    /// Расписание смен скорости в реальном времени
    pub fn speed_changes(&self) -> Vec<SpeedChange> {
        let mut changes = Vec::with_capacity(self.keyframes.len() * 2);
        for keyframe in &self.keyframes {
            changes.push(SpeedChange {
                at: keyframe.modified_start / self.multiplier,
                speed: keyframe.speed * self.multiplier,
            });
            changes.push(SpeedChange {
                at: keyframe.modified_end / self.multiplier,
                speed: self.multiplier,
            });
        }
        changes
    }

    pub fn playback(&self) -> RebuildPlayback {
        RebuildPlayback::new(self)
    }
}

/// Результат одного шага playback
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackStep {
    /// Смены скорости, случившиеся за шаг (по порядку)
    pub speed_changes: Vec<f32>,
    pub finished: bool,
}

/// Идущий ребилд: таймер + курсор по расписанию скоростей
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildPlayback {
    schedule: Vec<SpeedChange>,
    next: usize,
    elapsed: f32,
    total: f32,
    speed: f32,
}

impl RebuildPlayback {
    fn new(timeline: &RebuildTimeline) -> Self {
        let mut playback = Self {
            schedule: timeline.speed_changes(),
            next: 0,
            elapsed: 0.0,
            total: timeline.total_duration(),
            speed: timeline.multiplier(),
        };
        // Keyframe с нулевым стартом — скорость сразу
        playback.apply_due();
        playback
    }

    /// Текущая скорость обратной анимации (положительная)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total
    }

    pub fn tick(&mut self, delta: f32) -> PlaybackStep {
        self.elapsed += delta;
        let speed_changes = self.apply_due();
        PlaybackStep {
            speed_changes,
            finished: self.is_finished(),
        }
    }

    fn apply_due(&mut self) -> Vec<f32> {
        let mut applied = Vec::new();
        while let Some(change) = self.schedule.get(self.next) {
            if change.at > self.elapsed || change.at >= self.total {
                break;
            }
            self.speed = change.speed;
            applied.push(change.speed);
            self.next += 1;
        }
        applied
    }
}
