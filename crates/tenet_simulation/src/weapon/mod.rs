//! Weapon module — Ammo, Weapon, firing
//!
//! ECS ответственность:
//! - Ammo: clip/spare счётчики (inversion-aware)
//! - Weapon/Loadout: режимы, blackout, смена оружия
//! - Firing: TryShoot через InversionRules → ProjectileSpawned
//! - Ammo drops
//!
//! Host ответственность: полёт projectile, коллизии (→ ProjectileHit), звук.

use bevy::prelude::*;

pub mod ammo;
pub mod drop;
pub mod firing;
#[allow(clippy::module_inception)]
pub mod weapon;


pub use ammo::{Ammo, DamageType, DamageTypeFlags};
pub use drop::{AmmoDrop, AmmoDropCollected, AmmoDropSite, AmmoDropTouched};
pub use firing::{
    resolve_trigger, AudioCue, AudioCueKind, ProjectileSpawned, ReloadRequested, ShotOutcome, TriggerContext,
    TriggerPulled, WeaponChanged, WeaponModeRequested, WeaponSwapRequested, WithheldReason,
};
pub use weapon::{Loadout, Weapon, DEFAULT_BLACKOUT_DURATION};

use crate::config::DifficultySettings;
use crate::inversion::LevelStarted;
use crate::{DeterministicRng, SimulationSet};

/// Weapon Plugin
///
/// Порядок выполнения:
/// 1. tick_weapon_blackout (Timers)
/// 2. configure_weapons_on_level_start (Inversion) — стартовые патроны из сложности
/// 3. swap → mode → reload → trigger (Actions, chain)
/// 4. collect_ammo_drops (Reactions) — подбор от касаний и выстрелов
pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TriggerPulled>()
            .add_event::<ReloadRequested>()
            .add_event::<WeaponSwapRequested>()
            .add_event::<WeaponModeRequested>()
            .add_event::<ProjectileSpawned>()
            .add_event::<WeaponChanged>()
            .add_event::<AudioCue>()
            .add_event::<AmmoDropTouched>()
            .add_event::<AmmoDropCollected>()
            .register_type::<AmmoDrop>();

        app.add_systems(FixedUpdate, firing::tick_weapon_blackout.in_set(SimulationSet::Timers))
            .add_systems(
                FixedUpdate,
                configure_weapons_on_level_start.in_set(SimulationSet::Inversion),
            )
            .add_systems(
                FixedUpdate,
                (
                    firing::process_weapon_swaps,
                    firing::process_mode_requests,
                    firing::process_reload_requests,
                    firing::process_trigger_pulls,
                )
                    .chain()
                    .in_set(SimulationSet::Actions),
            )
            .add_systems(FixedUpdate, drop::collect_ammo_drops.in_set(SimulationSet::Reactions));
    }
}

/// Система: LevelStarted → стартовые патроны оружия из текущей сложности
///
/// Диапазоны сэмплируются из DeterministicRng (порядок по Entity).
pub fn configure_weapons_on_level_start(
    mut level_started: EventReader<LevelStarted>,
    mut weapons: Query<(Entity, &mut Weapon)>,
    settings: Res<DifficultySettings>,
    mut rng: ResMut<DeterministicRng>,
) {
    if level_started.read().count() == 0 {
        return;
    }

    let config = settings.current();
    let mut ordered: Vec<_> = weapons.iter_mut().collect();
    ordered.sort_by_key(|(entity, _)| *entity);

    for (_, mut weapon) in ordered {
        let Some(weapon_config) = config.weapon_config(&weapon.name) else {
            continue;
        };
        let in_clip = weapon_config.start_in_clip.sample(&mut rng.rng);
        let total = weapon_config.start_total.sample(&mut rng.rng);
        weapon.ammo_mut().configure(in_clip, total);
    }
}
