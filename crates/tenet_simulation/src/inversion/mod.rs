//! Inversion module — глобальное направление времени
//!
//! ECS ответственность:
//! - Session: текущее InversionState, разрешённая цель, таймер состояния
//! - InversionRules: смысл выстрела/перезарядки/лечения в каждом состоянии
//! - Drain: периодический урон игроку в Inverted
//!
//! Host ответственность: post-processing профиль, цвет трассеров
//! (по InversionStateChanged), trigger-зоны (→ InversionVolumeEntered/Exited).

use bevy::prelude::*;

pub mod drain;
pub mod rules;
pub mod session;
pub mod state;

#[cfg(test)]
mod rules_tests;

pub use drain::InversionDrain;
pub use rules::{
    AmmoConsumed, InversionRules, ProjectileLaunch, WeaponCheck, INVERSION_QUERY_RADIUS, REVERSE_SPAWN_OFFSET,
};
pub use session::Session;
pub use state::{
    InversionRequested, InversionState, InversionStateChanged, InversionVolumeEntered, InversionVolumeExited,
    LevelEnded, LevelStarted,
};

use crate::combat::{change_health, Dead, EntityDied, Health, HealthChanged};
use crate::config::DifficultySettings;
use crate::SimulationSet;

/// Inversion Plugin
///
/// Порядок выполнения:
/// 1. tick_session (Timers)
/// 2. volumes → requests → level start (Inversion, chain)
/// 3. apply_inversion_drain (Damage)
pub struct InversionPlugin;

impl Plugin for InversionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<InversionRules>()
            .add_event::<InversionRequested>()
            .add_event::<InversionVolumeEntered>()
            .add_event::<InversionVolumeExited>()
            .add_event::<InversionStateChanged>()
            .add_event::<LevelStarted>()
            .add_event::<LevelEnded>();

        app.add_systems(FixedUpdate, tick_session.in_set(SimulationSet::Timers))
            .add_systems(
                FixedUpdate,
                (
                    process_inversion_volumes,
                    process_inversion_requests,
                    refresh_on_level_start,
                )
                    .chain()
                    .in_set(SimulationSet::Inversion),
            )
            .add_systems(FixedUpdate, apply_inversion_drain.in_set(SimulationSet::Damage));
    }
}

/// Система: таймер текущего состояния
pub fn tick_session(mut session: ResMut<Session>, time: Res<Time<Fixed>>) {
    session.tick(time.delta_secs());
}

/// Система: trigger-зоны inversion (turnstile)
///
/// Вход разрешает переключение в target_state; если игрок уже в этом
/// состоянии — refresh (drain начинается заново).
///
/// Выходы обрабатываются до входов: переход из зоны A в соседнюю зону B
/// за один тик оставляет разрешение от B.
pub fn process_inversion_volumes(
    mut entered: EventReader<InversionVolumeEntered>,
    mut exited: EventReader<InversionVolumeExited>,
    mut session: ResMut<Session>,
    mut rules: ResMut<InversionRules>,
    settings: Res<DifficultySettings>,
) {
    for event in exited.read() {
        session.set_invertability(None, event.collider);
    }

    for event in entered.read() {
        session.set_invertability(Some(event.target_state), event.collider);

        if session.player() == Some(event.collider) && session.current() == event.target_state {
            session.refresh();
            rules.apply_inversion_effects(session.current(), settings.current());
            crate::logger::log(&format!("⏳ Inversion refreshed ({:?})", session.current()));
        }
    }
}

/// Система: InversionRequested → переключение состояния
pub fn process_inversion_requests(
    mut requests: EventReader<InversionRequested>,
    mut session: ResMut<Session>,
    mut rules: ResMut<InversionRules>,
    settings: Res<DifficultySettings>,
    mut changed: EventWriter<InversionStateChanged>,
) {
    for _ in requests.read() {
        let Some(previous) = session.activate_inversion() else {
            crate::logger::log("⏳ Inversion requested outside of a turnstile");
            continue;
        };

        let current = session.current();
        rules.apply_inversion_effects(current, settings.current());
        changed.write(InversionStateChanged { previous, current });
        crate::logger::log_info(&format!("⏳ Inversion: {:?} → {:?}", previous, current));
    }
}

/// Система: LevelStarted → эффекты текущего состояния с нуля
pub fn refresh_on_level_start(
    mut level_started: EventReader<LevelStarted>,
    mut session: ResMut<Session>,
    mut rules: ResMut<InversionRules>,
    settings: Res<DifficultySettings>,
) {
    if level_started.read().count() == 0 {
        return;
    }
    session.refresh();
    rules.apply_inversion_effects(session.current(), settings.current());
}

/// Система: drain pulses → урон игроку (доля max health)
pub fn apply_inversion_drain(
    mut rules: ResMut<InversionRules>,
    session: Res<Session>,
    mut healths: Query<&mut Health>,
    dead: Query<(), With<Dead>>,
    time: Res<Time<Fixed>>,
    mut health_changed: EventWriter<HealthChanged>,
    mut died: EventWriter<EntityDied>,
) {
    let Some((pulses, percent)) = rules.tick_drain(time.delta_secs()) else {
        return;
    };
    let Some(player) = session.player() else {
        return;
    };
    // Мёртвому игроку drain больше не наносит урон
    let Ok(mut health) = healths.get_mut(player) else {
        return;
    };
    if dead.contains(player) || !health.is_alive() {
        return;
    }

    for _ in 0..pulses {
        if !health.is_alive() {
            break;
        }
        let amount = health.max() * percent;
        change_health(player, &mut health, -amount, &mut health_changed, &mut died);
    }
}
