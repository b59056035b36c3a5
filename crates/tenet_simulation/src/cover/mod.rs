//! Cover module — разрушаемые укрытия
//!
//! ECS ответственность:
//! - DestructibleCover: Intact → Destroyed → Rebuilding → Intact
//! - Реакция на MarkerChanged своего HistoryTarget
//! - Keyframe-таймер обратной анимации
//!
//! Host ответственность: смена мешей (CoverVisualChanged), AnimationPlayer
//! (CoverAnimation: скорость со знаком + перемотка).

use bevy::prelude::*;

pub mod destructible;
pub mod timeline;

pub use destructible::{CoverConfig, CoverOutput, CoverState, CoverVisual, DestructibleCover};
pub use timeline::{PlaybackStep, RebuildKeyframe, RebuildPlayback, RebuildTimeline, SpeedChange};

use crate::history::{HistoryTarget, MarkerChanged};
use crate::SimulationSet;

/// Event: сменить меш укрытия
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverVisualChanged {
    pub cover: Entity,
    pub visual: CoverVisual,
}

/// Event: управление анимацией укрытия
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CoverAnimation {
    pub cover: Entity,
    /// < 0 = обратное воспроизведение
    pub speed: f32,
    /// Some = перемотать на нормализованное время
    pub normalized_time: Option<f32>,
}

/// Cover Plugin
///
/// Порядок:
/// 1. tick_covers (Timers)
/// 2. react_to_markers (Reactions) — после попаданий и un-shoot этого тика
pub struct CoverPlugin;

impl Plugin for CoverPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CoverVisualChanged>().add_event::<CoverAnimation>();

        app.add_systems(FixedUpdate, tick_covers.in_set(SimulationSet::Timers))
            .add_systems(FixedUpdate, react_to_markers.in_set(SimulationSet::Reactions));
    }
}

fn emit_outputs(
    cover: Entity,
    outputs: Vec<CoverOutput>,
    visuals: &mut EventWriter<CoverVisualChanged>,
    animations: &mut EventWriter<CoverAnimation>,
) {
    for output in outputs {
        match output {
            CoverOutput::Visual(visual) => {
                visuals.write(CoverVisualChanged { cover, visual });
            }
            CoverOutput::Animation { speed, normalized_time } => {
                animations.write(CoverAnimation {
                    cover,
                    speed,
                    normalized_time,
                });
            }
        }
    }
}

/// Система: таймер ребилда
pub fn tick_covers(
    mut covers: Query<(Entity, &mut DestructibleCover)>,
    time: Res<Time<Fixed>>,
    mut visuals: EventWriter<CoverVisualChanged>,
    mut animations: EventWriter<CoverAnimation>,
) {
    let delta = time.delta_secs();

    for (entity, mut cover) in covers.iter_mut() {
        if !cover.is_rebuilding() {
            continue;
        }
        let outputs = cover.tick(delta);
        if cover.is_intact() {
            crate::logger::log(&format!("🧱 Cover {:?} rebuilt", entity));
        }
        emit_outputs(entity, outputs, &mut visuals, &mut animations);
    }
}

/// Система: MarkerChanged → destroy/rebuild
///
/// Решение по итоговому набору маркеров (несколько событий за тик на одно
/// укрытие схлопываются).
pub fn react_to_markers(
    mut marker_events: EventReader<MarkerChanged>,
    mut covers: Query<(&mut DestructibleCover, &HistoryTarget)>,
    mut visuals: EventWriter<CoverVisualChanged>,
    mut animations: EventWriter<CoverAnimation>,
) {
    let mut touched: Vec<Entity> = marker_events.read().map(|event| event.target).collect();
    touched.sort();
    touched.dedup();

    for entity in touched {
        let Ok((mut cover, target)) = covers.get_mut(entity) else {
            continue;
        };

        let outputs = if target.has_damage_type(&cover.damage_filter) {
            cover.destroy()
        } else {
            cover.rebuild()
        };
        if outputs.is_empty() {
            continue;
        }

        crate::logger::log(&format!(
            "🧱 Cover {:?}: {}",
            entity,
            if cover.is_destroyed() { "destroyed" } else { "rebuilding" }
        ));
        emit_outputs(entity, outputs, &mut visuals, &mut animations);
    }
}
