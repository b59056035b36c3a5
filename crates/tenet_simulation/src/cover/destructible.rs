//! DestructibleCover — укрытие, которое разрушается попаданием и
//! собирается обратно, когда inversion забирает маркеры.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::timeline::{RebuildKeyframe, RebuildPlayback, RebuildTimeline};
use crate::config::ConfigError;
use crate::history::HistoryTarget;
use crate::weapon::DamageTypeFlags;

/// Authoring data укрытия
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Длительность анимации разрушения (секунды, speed 1)
    pub base_duration: f32,
    pub keyframes: Vec<RebuildKeyframe>,
    /// Желаемая длительность ребилда (только ускоряет)
    pub target_duration: Option<f32>,
    /// Какие типы урона держат укрытие разрушенным
    pub damage_filter: DamageTypeFlags,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            base_duration: 1.0,
            keyframes: Vec::new(),
            target_duration: None,
            damage_filter: DamageTypeFlags::everything(),
        }
    }
}

/// Какой меш показывать
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverVisual {
    Pristine,
    Destroyed,
}

/// Запрос к host'у (визуал/анимация)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverOutput {
    Visual(CoverVisual),
    /// speed < 0 = обратное воспроизведение; normalized_time = перемотка
    Animation { speed: f32, normalized_time: Option<f32> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoverState {
    Intact,
    Destroyed,
    Rebuilding(RebuildPlayback),
}

#[derive(Component, Debug, Clone)]
#[require(HistoryTarget)]
pub struct DestructibleCover {
    state: CoverState,
    pub damage_filter: DamageTypeFlags,
    timeline: RebuildTimeline,
}

impl DestructibleCover {
    pub fn new(timeline: RebuildTimeline, damage_filter: DamageTypeFlags) -> Self {
        Self {
            state: CoverState::Intact,
            damage_filter,
            timeline,
        }
    }

    pub fn from_config(config: &CoverConfig) -> Result<Self, ConfigError> {
        let timeline = RebuildTimeline::new(config.base_duration, config.keyframes.clone(), config.target_duration)?;
        Ok(Self::new(timeline, config.damage_filter.clone()))
    }

    pub fn state(&self) -> &CoverState {
        &self.state
    }

    pub fn timeline(&self) -> &RebuildTimeline {
        &self.timeline
    }

    pub fn is_intact(&self) -> bool {
        matches!(self.state, CoverState::Intact)
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, CoverState::Destroyed)
    }

    pub fn is_rebuilding(&self) -> bool {
        matches!(self.state, CoverState::Rebuilding(_))
    }

    /// Разрушить (прерывает идущий ребилд). Уже разрушенное — no-op.
    pub fn destroy(&mut self) -> Vec<CoverOutput> {
        if self.is_destroyed() {
            return Vec::new();
        }
        self.state = CoverState::Destroyed;
        vec![
            CoverOutput::Visual(CoverVisual::Destroyed),
            CoverOutput::Animation {
                speed: 1.0,
                normalized_time: Some(0.0),
            },
        ]
    }

    /// Начать ребилд (только из Destroyed)
    pub fn rebuild(&mut self) -> Vec<CoverOutput> {
        if !self.is_destroyed() {
            return Vec::new();
        }
        let playback = self.timeline.playback();
        let speed = playback.speed();
        self.state = CoverState::Rebuilding(playback);
        vec![CoverOutput::Animation {
            speed: -speed,
            normalized_time: Some(1.0),
        }]
    }

    pub fn tick(&mut self, delta: f32) -> Vec<CoverOutput> {
        let CoverState::Rebuilding(playback) = &mut self.state else {
            return Vec::new();
        };

        let step = playback.tick(delta);
        let mut outputs: Vec<CoverOutput> = step
            .speed_changes
            .iter()
            .map(|speed| CoverOutput::Animation {
                speed: -*speed,
                normalized_time: None,
            })
            .collect();

        if step.finished {
            self.state = CoverState::Intact;
            outputs.push(CoverOutput::Visual(CoverVisual::Pristine));
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::DamageType;

    fn cover() -> DestructibleCover {
        let timeline = RebuildTimeline::new(
            10.0,
            vec![RebuildKeyframe::new(0.0, 0.2, 2.0), RebuildKeyframe::new(0.5, 0.2, 0.5)],
            None,
        )
        .unwrap();
        DestructibleCover::new(timeline, DamageTypeFlags::new([DamageType::Explosive]))
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut cover = cover();
        let outputs = cover.destroy();
        assert_eq!(outputs[0], CoverOutput::Visual(CoverVisual::Destroyed));
        assert!(cover.is_destroyed());
        assert!(cover.destroy().is_empty());
    }

    #[test]
    fn test_rebuild_only_from_destroyed() {
        let mut cover = cover();
        assert!(cover.rebuild().is_empty());
        assert!(cover.is_intact());

        cover.destroy();
        let outputs = cover.rebuild();
        // Первый keyframe стартует в 0 — сразу его скорость, в обратную сторону
        assert_eq!(
            outputs,
            vec![CoverOutput::Animation {
                speed: -2.0,
                normalized_time: Some(1.0)
            }]
        );
        assert!(cover.is_rebuilding());
        assert!(cover.rebuild().is_empty());
    }

    #[test]
    fn test_rebuild_completes_to_intact() {
        let mut cover = cover();
        cover.destroy();
        cover.rebuild();

        assert_eq!(
            cover.tick(1.5),
            vec![CoverOutput::Animation {
                speed: -1.0,
                normalized_time: None
            }]
        );
        assert!(cover.tick(6.0).iter().any(|o| matches!(o, CoverOutput::Animation { .. })));
        assert_eq!(cover.tick(1.0), vec![CoverOutput::Visual(CoverVisual::Pristine)]);
        assert!(cover.is_intact());
        assert!(cover.tick(1.0).is_empty());
    }

    #[test]
    fn test_destroy_cancels_rebuild() {
        let mut cover = cover();
        cover.destroy();
        cover.rebuild();
        cover.tick(2.0);

        assert!(!cover.destroy().is_empty());
        assert!(cover.is_destroyed());
        assert!(cover.tick(100.0).is_empty());

        // Новый ребилд — playback с нуля
        cover.rebuild();
        match cover.state() {
            CoverState::Rebuilding(playback) => assert_eq!(playback.elapsed(), 0.0),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_propagates() {
        let config = CoverConfig {
            base_duration: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            DestructibleCover::from_config(&config),
            Err(ConfigError::InvalidBaseDuration(_))
        ));

        let cover = DestructibleCover::from_config(&CoverConfig::default()).unwrap();
        assert!(cover.damage_filter.has_flag(DamageType::Normal));
        assert_eq!(cover.timeline().total_duration(), 1.0);
    }
}
