//! Weapon firing — TryShoot/Reload/Swap поверх InversionRules
//!
//! Architecture:
//! - ECS: решение "стрелять / перезарядить / подобрать drop", счётчики Ammo, blackout
//! - Host: визуал projectile, полёт, коллизии → ProjectileHit обратно в ECS
//! - Events: TriggerPulled (host→ECS), ProjectileSpawned (ECS→host)

use bevy::prelude::*;

use super::ammo::DamageType;
use super::drop::{drop_sites, AmmoDrop, AmmoDropSite, AmmoDropTouched};
use super::weapon::{Loadout, Weapon};
use crate::config::DifficultySettings;
use crate::history::{HistoryMarkers, HistoryTarget, MarkerChanged};
use crate::inversion::{AmmoConsumed, InversionRules, InversionState, Session};
use crate::spatial::{SpatialOracle, SpatialOracleHandle};

/// Event: holder нажал спуск (текущее оружие Loadout)
#[derive(Event, Debug, Clone, Copy)]
pub struct TriggerPulled {
    pub shooter: Entity,
}

/// Event: ручная перезарядка текущего оружия
#[derive(Event, Debug, Clone, Copy)]
pub struct ReloadRequested {
    pub shooter: Entity,
}

/// Event: смена оружия
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponSwapRequested {
    pub shooter: Entity,
    /// None = следующее по кругу
    pub index: Option<usize>,
}

/// Event: смена режима (Ammo) текущего оружия
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponModeRequested {
    pub shooter: Entity,
    pub mode: usize,
}

/// Event: projectile запущен (ECS → host)
///
/// Host ведёт полёт и присылает `ProjectileHit` с теми же `weapon`/`mode`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ProjectileSpawned {
    /// Оружие-источник (урон и trigger radius берутся из его Ammo)
    pub weapon: Entity,

    /// Режим оружия на момент выстрела
    pub mode: usize,

    /// Кто стрелял
    pub shooter: Entity,

    pub position: Vec3,
    pub direction: Vec3,

    /// Inverted: projectile летит обратно к стрелку
    pub homing_target: Option<Entity>,

    pub damage_type: DamageType,

    /// true = "обратная" пуля (урона не наносит, маркер не создаёт)
    pub reversed: bool,
}

/// Event: текущее оружие holder'а сменилось
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponChanged {
    pub holder: Entity,
    pub weapon: Entity,
}

/// Звук, который должен проиграть host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCueKind {
    Shoot,
    Reload,
}

/// Event: audio cue (ECS → host)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCue {
    pub source: Entity,
    pub kind: AudioCueKind,
}

/// Почему выстрел не состоялся
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithheldReason {
    /// InversionRules запретили (нет маркера/не тот DamageType/луч в пустоту)
    NotAllowed,
    Blackout,
}

/// Результат `resolve_trigger`
#[derive(Debug, Clone, PartialEq)]
pub enum ShotOutcome {
    Withheld(WithheldReason),
    /// Луч попал в ammo drop: подбор вместо выстрела
    CollectDrop(Entity),
    /// Auto-reload (false = перезаряжать было нечего)
    Reloaded(bool),
    Fired(AmmoConsumed),
}

/// Контекст сессии для одного нажатия спуска
pub struct TriggerContext<'a> {
    pub state: InversionState,
    pub rules: &'a InversionRules,
    pub oracle: &'a dyn SpatialOracle,
    pub drops: &'a [AmmoDropSite],
    pub blackout_multiplier: f32,
}

/// TryShoot: can_use_weapon → blackout → drop / auto-reload / consume ammo
pub fn resolve_trigger(
    weapon: &mut Weapon,
    shooter: Entity,
    ctx: &TriggerContext,
    markers: &mut HistoryMarkers,
) -> ShotOutcome {
    let check = ctx
        .rules
        .can_use_weapon(ctx.state, weapon.ammo(), &weapon.muzzle, ctx.oracle, markers, ctx.drops);
    if !check.allowed {
        return ShotOutcome::Withheld(WithheldReason::NotAllowed);
    }
    if weapon.is_blackout() {
        return ShotOutcome::Withheld(WithheldReason::Blackout);
    }

    if let Some(drop) = check.ammo_drop {
        return ShotOutcome::CollectDrop(drop);
    }

    if ctx.rules.should_auto_reload(ctx.state, weapon.ammo()) {
        return ShotOutcome::Reloaded(reload(weapon, ctx));
    }

    let muzzle = weapon.muzzle;
    match ctx
        .rules
        .consume_ammo(ctx.state, weapon.ammo_mut(), &muzzle, shooter, check.marker, markers)
    {
        Some(consumed) => {
            weapon.start_blackout(ctx.blackout_multiplier);
            ShotOutcome::Fired(consumed)
        }
        None => ShotOutcome::Withheld(WithheldReason::NotAllowed),
    }
}

/// Reload: только вне blackout; успешная перезарядка даёт blackout
pub fn reload(weapon: &mut Weapon, ctx: &TriggerContext) -> bool {
    if weapon.is_blackout() || !ctx.rules.try_reload_ammo(ctx.state, weapon.ammo_mut()) {
        return false;
    }
    weapon.start_blackout(ctx.blackout_multiplier);
    true
}

/// Система: TriggerPulled → выстрел текущим оружием
#[allow(clippy::too_many_arguments)]
pub fn process_trigger_pulls(
    mut triggers: EventReader<TriggerPulled>,
    loadouts: Query<&Loadout>,
    mut weapons: Query<&mut Weapon>,
    mut targets: Query<&mut HistoryTarget>,
    drops: Query<(Entity, &Transform, &AmmoDrop)>,
    mut markers: ResMut<HistoryMarkers>,
    session: Res<Session>,
    rules: Res<InversionRules>,
    settings: Res<DifficultySettings>,
    oracle: Res<SpatialOracleHandle>,
    mut projectiles: EventWriter<ProjectileSpawned>,
    mut audio: EventWriter<AudioCue>,
    mut marker_events: EventWriter<MarkerChanged>,
    mut touched: EventWriter<AmmoDropTouched>,
) {
    if triggers.is_empty() {
        return;
    }

    let sites = drop_sites(drops.iter());
    let ctx = TriggerContext {
        state: session.current(),
        rules: &rules,
        oracle: oracle.oracle(),
        drops: &sites,
        blackout_multiplier: settings.current().weapon_blackout_multiplier,
    };

    for event in triggers.read() {
        let Some(weapon_entity) = loadouts.get(event.shooter).ok().and_then(Loadout::current) else {
            continue;
        };
        let Ok(mut weapon) = weapons.get_mut(weapon_entity) else {
            continue;
        };

        match resolve_trigger(&mut weapon, event.shooter, &ctx, &mut markers) {
            ShotOutcome::Withheld(reason) => {
                crate::logger::log(&format!("🔫 {:?} trigger withheld: {:?}", event.shooter, reason));
            }
            ShotOutcome::CollectDrop(drop) => {
                touched.write(AmmoDropTouched {
                    drop,
                    collector: event.shooter,
                });
            }
            ShotOutcome::Reloaded(success) => {
                if success {
                    audio.write(AudioCue {
                        source: weapon_entity,
                        kind: AudioCueKind::Reload,
                    });
                }
            }
            ShotOutcome::Fired(consumed) => {
                if let Some((marker, damage_type)) = consumed.marker {
                    for released in &consumed.released {
                        let Ok(mut target) = targets.get_mut(*released) else {
                            continue;
                        };
                        if target.unregister_marker(marker) {
                            marker_events.write(MarkerChanged {
                                target: *released,
                                marker,
                                damage_type,
                                added: false,
                            });
                        }
                    }
                }

                let launch = consumed.projectile;
                projectiles.write(ProjectileSpawned {
                    weapon: weapon_entity,
                    mode: weapon.mode(),
                    shooter: event.shooter,
                    position: launch.position,
                    direction: launch.direction,
                    homing_target: launch.homing_target,
                    damage_type: weapon.ammo().damage_type(),
                    reversed: launch.reversed,
                });
                audio.write(AudioCue {
                    source: weapon_entity,
                    kind: AudioCueKind::Shoot,
                });

                crate::logger::log(&format!(
                    "🔫 {:?} fired '{}' ({:?}): clip {}/{}, spare {}",
                    event.shooter,
                    weapon.name,
                    ctx.state,
                    weapon.ammo().current_count(),
                    weapon.ammo().clip_count(),
                    weapon.ammo().spare_count()
                ));
            }
        }
    }
}

/// Система: ручная перезарядка
pub fn process_reload_requests(
    mut requests: EventReader<ReloadRequested>,
    loadouts: Query<&Loadout>,
    mut weapons: Query<&mut Weapon>,
    session: Res<Session>,
    rules: Res<InversionRules>,
    settings: Res<DifficultySettings>,
    oracle: Res<SpatialOracleHandle>,
    mut audio: EventWriter<AudioCue>,
) {
    let ctx = TriggerContext {
        state: session.current(),
        rules: &rules,
        oracle: oracle.oracle(),
        drops: &[],
        blackout_multiplier: settings.current().weapon_blackout_multiplier,
    };

    for event in requests.read() {
        let Some(weapon_entity) = loadouts.get(event.shooter).ok().and_then(Loadout::current) else {
            continue;
        };
        let Ok(mut weapon) = weapons.get_mut(weapon_entity) else {
            continue;
        };

        if reload(&mut weapon, &ctx) {
            audio.write(AudioCue {
                source: weapon_entity,
                kind: AudioCueKind::Reload,
            });
        }
    }
}

/// Система: смена оружия (новое активируется с принудительным blackout)
pub fn process_weapon_swaps(
    mut requests: EventReader<WeaponSwapRequested>,
    mut loadouts: Query<&mut Loadout>,
    mut weapons: Query<&mut Weapon>,
    settings: Res<DifficultySettings>,
    mut changed: EventWriter<WeaponChanged>,
) {
    let multiplier = settings.current().weapon_blackout_multiplier;

    for event in requests.read() {
        let Ok(mut loadout) = loadouts.get_mut(event.shooter) else {
            continue;
        };
        let index = event.index.unwrap_or_else(|| loadout.next_index());
        let Some((previous, next)) = loadout.select(index) else {
            continue;
        };

        if let Some(previous) = previous {
            if let Ok(mut weapon) = weapons.get_mut(previous) {
                weapon.activate(false, multiplier);
            }
        }
        if let Ok(mut weapon) = weapons.get_mut(next) {
            weapon.activate(true, multiplier);
            crate::logger::log(&format!("🔫 {:?} switched to '{}'", event.shooter, weapon.name));
        }

        changed.write(WeaponChanged {
            holder: event.shooter,
            weapon: next,
        });
    }
}

/// Система: смена режима текущего оружия
pub fn process_mode_requests(
    mut requests: EventReader<WeaponModeRequested>,
    loadouts: Query<&Loadout>,
    mut weapons: Query<&mut Weapon>,
) {
    for event in requests.read() {
        let Some(weapon_entity) = loadouts.get(event.shooter).ok().and_then(Loadout::current) else {
            continue;
        };
        if let Ok(mut weapon) = weapons.get_mut(weapon_entity) {
            if weapon.set_mode(event.mode) {
                crate::logger::log(&format!(
                    "🔫 '{}' mode {} ({:?})",
                    weapon.name,
                    weapon.mode(),
                    weapon.ammo().damage_type()
                ));
            }
        }
    }
}

/// Система: blackout countdown
pub fn tick_weapon_blackout(mut weapons: Query<&mut Weapon>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut weapon in weapons.iter_mut() {
        if weapon.is_blackout() {
            weapon.tick_blackout(delta);
        }
    }
}
