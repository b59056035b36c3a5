//! Turret systems (обнаружение игрока, автострельба).

use bevy::prelude::*;

use super::events::TurretEngaged;
use super::turret::Turret;
use crate::combat::Dead;
use crate::inversion::Session;
use crate::spatial::SpatialOracleHandle;
use crate::weapon::{Loadout, TriggerPulled, Weapon};

/// Система: игрок в радиусе и в прямой видимости → окно автострельбы
///
/// Line of sight: луч от турели к игроку должен упереться в самого игрока.
/// Пока игрок виден, окно продлевается каждый тик.
pub fn detect_player(
    mut turrets: Query<(Entity, &Transform, &mut Turret), Without<Dead>>,
    transforms: Query<&Transform, Without<Dead>>,
    session: Res<Session>,
    oracle: Res<SpatialOracleHandle>,
    mut engaged: EventWriter<TurretEngaged>,
) {
    let Some(player) = session.player() else {
        return;
    };
    let Ok(player_transform) = transforms.get(player) else {
        return;
    };
    let target = player_transform.translation;

    for (entity, transform, mut turret) in turrets.iter_mut() {
        let origin = transform.translation;
        let offset = target - origin;
        if offset.length() > turret.detection_radius {
            continue;
        }
        let Some(direction) = offset.try_normalize() else {
            continue;
        };

        let visible = oracle
            .oracle()
            .raycast(origin, direction)
            .is_some_and(|hit| hit.entity == Some(player));
        if !visible {
            continue;
        }

        if turret.start_shooting_at(target) {
            crate::logger::log(&format!("👁️ Turret {:?} spotted player at {:?}", entity, target));
            engaged.write(TurretEngaged {
                turret: entity,
                target_position: target,
            });
        }
    }
}

/// Система: окно автострельбы → доводка дула → TriggerPulled
///
/// Темп стрельбы ограничен blackout'ом оружия.
pub fn turret_fire(
    mut turrets: Query<(Entity, &mut Turret, &Loadout), Without<Dead>>,
    mut weapons: Query<&mut Weapon>,
    time: Res<Time<Fixed>>,
    mut triggers: EventWriter<TriggerPulled>,
) {
    let delta = time.delta_secs();

    for (entity, mut turret, loadout) in turrets.iter_mut() {
        let was_shooting = turret.is_shooting();
        let aim_point = turret.tick(delta);
        if was_shooting && !turret.is_shooting() {
            crate::logger::log(&format!("💤 Turret {:?} auto-shoot window closed", entity));
        }
        let Some(aim_point) = aim_point else {
            continue;
        };
        let Some(mut weapon) = loadout.current().and_then(|current| weapons.get_mut(current).ok()) else {
            continue;
        };

        let Some(desired) = (aim_point - weapon.muzzle.position).try_normalize() else {
            continue;
        };
        let forward = turret.aim(weapon.muzzle.forward, desired);
        weapon.muzzle.forward = forward;

        if weapon.is_blackout() {
            continue;
        }
        triggers.write(TriggerPulled { shooter: entity });
    }
}
