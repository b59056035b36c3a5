//! Projectile hits → HistoryMarker + урон по фракциям.

use bevy::prelude::*;

use super::health::{change_health, EntityDied, Faction, Health, HealthChanged};
use crate::history::{HistoryMarkers, HistoryTarget, MarkerChanged, MarkerId};
use crate::inversion::Session;
use crate::spatial::SpatialOracle;
use crate::spatial::SpatialOracleHandle;
use crate::weapon::{Ammo, AmmoDrop, AmmoDropTouched, Weapon};

/// Event: projectile попал (host → ECS)
#[derive(Event, Debug, Clone)]
pub struct ProjectileHit {
    /// Оружие-источник (из ProjectileSpawned)
    pub weapon: Entity,

    /// Режим оружия на момент выстрела
    pub mode: usize,

    /// Во что попали (None = статическая геометрия)
    pub hit_entity: Option<Entity>,

    /// Точка контакта
    pub point: Vec3,

    /// Reversed projectile (вернулся к стрелку) — поглощается без эффекта
    pub reversed: bool,
}

/// Кого задело попадание: прямая цель (radius ≤ 0) или сфера через оракул
pub fn hit_candidates(
    ammo: &Ammo,
    hit_entity: Option<Entity>,
    point: Vec3,
    oracle: &dyn SpatialOracle,
) -> Vec<Entity> {
    let mut candidates: Vec<Entity> = if ammo.trigger_radius <= 0.0 {
        hit_entity.into_iter().collect()
    } else {
        oracle.overlap_sphere(point, ammo.trigger_radius)
    };
    candidates.sort();
    candidates.dedup();
    candidates
}

/// Записать попадание в историю: маркер + регистрация на HistoryTarget кандидатов
pub fn record_history(
    ammo: &Ammo,
    point: Vec3,
    candidates: &[Entity],
    markers: &mut HistoryMarkers,
    targets: &mut Query<&mut HistoryTarget>,
    marker_events: &mut EventWriter<MarkerChanged>,
) -> MarkerId {
    let id = markers.record_hit(point, ammo.trigger_radius, ammo.damage_type());

    for candidate in candidates {
        let Ok(mut target) = targets.get_mut(*candidate) else {
            continue;
        };
        if let Some(record) = markers.last_record_mut(id) {
            record.add_target(*candidate);
        }
        if target.register_marker(id, ammo.damage_type()) {
            marker_events.write(MarkerChanged {
                target: *candidate,
                marker: id,
                damage_type: ammo.damage_type(),
                added: true,
            });
        }
    }
    id
}

/// Система: ProjectileHit → маркер + урон
///
/// Урон получают только кандидаты с Health, чья Faction враждебна holder'у.
#[allow(clippy::too_many_arguments)]
pub fn apply_projectile_hits(
    mut hits: EventReader<ProjectileHit>,
    weapons: Query<&Weapon>,
    factions: Query<&Faction>,
    mut healths: Query<&mut Health>,
    mut targets: Query<&mut HistoryTarget>,
    drops: Query<(), With<AmmoDrop>>,
    mut markers: ResMut<HistoryMarkers>,
    session: Res<Session>,
    oracle: Res<SpatialOracleHandle>,
    mut marker_events: EventWriter<MarkerChanged>,
    mut health_changed: EventWriter<HealthChanged>,
    mut died: EventWriter<EntityDied>,
    mut touched: EventWriter<AmmoDropTouched>,
) {
    for hit in hits.read() {
        if hit.reversed {
            crate::logger::log(&format!("↩️ Reversed projectile from {:?} absorbed", hit.weapon));
            continue;
        }
        let Ok(weapon) = weapons.get(hit.weapon) else {
            crate::logger::log_warning(&format!("ProjectileHit from unknown weapon {:?}", hit.weapon));
            continue;
        };
        let ammo = weapon.modes().get(hit.mode).unwrap_or_else(|| weapon.ammo());

        // Выстрел по ammo drop = подбор (достаётся игроку)
        if let Some(drop) = hit.hit_entity.filter(|entity| drops.contains(*entity)) {
            if let Some(player) = session.player() {
                touched.write(AmmoDropTouched {
                    drop,
                    collector: player,
                });
            }
            continue;
        }

        let candidates = hit_candidates(ammo, hit.hit_entity, hit.point, oracle.oracle());
        let marker = record_history(
            ammo,
            hit.point,
            &candidates,
            &mut markers,
            &mut targets,
            &mut marker_events,
        );

        let attacker = factions.get(weapon.holder).copied().unwrap_or_default();
        for candidate in &candidates {
            let victim = factions.get(*candidate).copied().unwrap_or_default();
            if !attacker.is_hostile_to(victim) {
                continue;
            }
            if let Ok(mut health) = healths.get_mut(*candidate) {
                change_health(*candidate, &mut health, -ammo.damage, &mut health_changed, &mut died);
            }
        }

        crate::logger::log(&format!(
            "💥 Hit at {:?} ({:?}): marker {:?}, {} candidate(s)",
            hit.point,
            ammo.damage_type(),
            marker,
            candidates.len()
        ));
    }
}
