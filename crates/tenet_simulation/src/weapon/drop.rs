//! Ammo drop — подбираемый запас патронов на уровне.

use bevy::prelude::*;

use crate::inversion::{InversionRules, Session};
use super::weapon::{Loadout, Weapon};

/// Компонент: ammo drop (позиция — из Transform)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct AmmoDrop {
    /// Радиус trigger-сферы (попадание луча/projectile рядом = подбор)
    pub burst_radius: f32,
    /// Сколько патронов получает каждое оружие подобравшего
    pub amount: i32,
}

impl Default for AmmoDrop {
    fn default() -> Self {
        Self {
            burst_radius: 1.5,
            amount: 10,
        }
    }
}

/// Снимок drop'а для `InversionRules::can_use_weapon` (без ECS доступа)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmmoDropSite {
    pub entity: Entity,
    pub position: Vec3,
    pub radius: f32,
}

/// Event (input/internal): drop подобран (касание игрока, выстрел по drop)
#[derive(Event, Debug, Clone, Copy)]
pub struct AmmoDropTouched {
    pub drop: Entity,
    pub collector: Entity,
}

/// Event (output): drop подобран и удалён
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AmmoDropCollected {
    pub drop: Entity,
    pub collector: Entity,
    pub amount: i32,
}

/// Собрать все drop'ы в снимки (детерминированный порядок по Entity)
pub fn drop_sites<'a>(drops: impl Iterator<Item = (Entity, &'a Transform, &'a AmmoDrop)>) -> Vec<AmmoDropSite> {
    let mut sites: Vec<_> = drops
        .map(|(entity, transform, drop)| AmmoDropSite {
            entity,
            position: transform.translation,
            radius: drop.burst_radius,
        })
        .collect();
    sites.sort_by_key(|site| site.entity);
    sites
}

/// Система: AmmoDropTouched → патроны во все оружия collector'а, drop despawn
pub fn collect_ammo_drops(
    mut commands: Commands,
    mut touched: EventReader<AmmoDropTouched>,
    mut collected: EventWriter<AmmoDropCollected>,
    drops: Query<&AmmoDrop>,
    loadouts: Query<&Loadout>,
    mut weapons: Query<&mut Weapon>,
    session: Res<Session>,
    rules: Res<InversionRules>,
) {
    let mut consumed: Vec<Entity> = Vec::new();

    for event in touched.read() {
        if consumed.contains(&event.drop) {
            continue;
        }
        let Ok(drop) = drops.get(event.drop) else {
            continue;
        };
        let Ok(loadout) = loadouts.get(event.collector) else {
            crate::logger::log_warning(&format!(
                "AmmoDrop {:?} touched by {:?} without Loadout",
                event.drop, event.collector
            ));
            continue;
        };

        for weapon_entity in loadout.weapons() {
            if let Ok(mut weapon) = weapons.get_mut(*weapon_entity) {
                rules.consume_ammo_drop(session.current(), drop.amount, weapon.ammo_mut());
            }
        }

        consumed.push(event.drop);
        commands.entity(event.drop).despawn();
        collected.write(AmmoDropCollected {
            drop: event.drop,
            collector: event.collector,
            amount: drop.amount,
        });

        crate::logger::log(&format!(
            "📦 AmmoDrop {:?} collected by {:?} (+{} per weapon, {:?})",
            event.drop,
            event.collector,
            drop.amount,
            session.current()
        ));
    }
}
