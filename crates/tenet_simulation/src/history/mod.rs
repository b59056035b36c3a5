//! History module — память попаданий для inversion
//!
//! ECS ответственность:
//! - HistoryMarkers (arena): LIFO стек записей по локациям
//! - HistoryTarget: какие маркеры висят на entity
//! - MarkerGenerator: pre-placed маркеры уровня
//!
//! Host ответственность: визуал маркеров (decals, gizmo), физика trigger'ов
//! не нужна — сферы маркеров проверяются в симуляции.

use bevy::prelude::*;

pub mod generator;
pub mod marker;
pub mod target;


pub use generator::{resolve_damage_type, MarkerGenerator};
pub use marker::{HistoryMarker, HistoryMarkers, HistoryRecord, MarkerId, EMPTY_TIMESTAMP};
pub use target::{HistoryTarget, MarkerChanged};

use crate::SimulationSet;

/// History Plugin
///
/// Порядок:
/// 1. generate_markers (Inversion set) — LevelStarted → pre-placed маркеры
/// 2. prune_dead_markers (Damage set, после попаданий) — safety net для мёртвых id
pub struct HistoryPlugin;

impl Plugin for HistoryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HistoryMarkers>()
            .add_event::<MarkerChanged>()
            .register_type::<MarkerGenerator>();

        app.add_systems(FixedUpdate, generator::generate_markers.in_set(SimulationSet::Inversion))
            .add_systems(
                FixedUpdate,
                prune_dead_markers
                    .in_set(SimulationSet::Damage)
                    .after(crate::combat::apply_projectile_hits),
            );
    }
}

/// Система: снять с HistoryTarget маркеры, умершие без явного unregister
pub fn prune_dead_markers(
    mut targets: Query<(Entity, &mut HistoryTarget)>,
    markers: Res<HistoryMarkers>,
    mut marker_events: EventWriter<MarkerChanged>,
) {
    for (entity, mut target) in targets.iter_mut() {
        // Не трогаем Mut без нужды (change detection)
        if target.markers().iter().all(|(id, _)| markers.is_alive(*id)) {
            continue;
        }

        for (marker, damage_type) in target.prune_dead(&markers) {
            crate::logger::log_warning(&format!(
                "HistoryTarget {:?}: marker {:?} died without unregister",
                entity, marker
            ));
            marker_events.write(MarkerChanged {
                target: entity,
                marker,
                damage_type,
                added: false,
            });
        }
    }
}
