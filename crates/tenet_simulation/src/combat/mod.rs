//! Combat module (host-driven hits)
//!
//! ECS ответственность:
//! - Game state: Health, Faction, HealCooldown
//! - Rules: faction-filtered damage, heal checks, death
//! - Events: HealthChanged, EntityDied, HealFailed
//!
//! Host ответственность:
//! - Полёт projectile, коллизии → ProjectileHit
//! - Death VFX (по EntityDied)

use bevy::prelude::*;

pub mod damage;
pub mod health;

pub use damage::{apply_projectile_hits, hit_candidates, record_history, ProjectileHit};
pub use health::{
    change_health, check_heal, Damageable, Dead, EntityDied, Faction, HealCooldown, HealFailReason, HealFailed,
    HealRequested, Health, HealthChanged,
};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок выполнения:
/// 1. tick_heal_cooldown (Timers)
/// 2. reset_player_on_level_start (Inversion)
/// 3. process_heal_requests (Actions)
/// 4. apply_projectile_hits (Damage)
/// 5. handle_deaths (Reactions)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileHit>()
            .add_event::<HealthChanged>()
            .add_event::<EntityDied>()
            .add_event::<HealRequested>()
            .add_event::<HealFailed>()
            .register_type::<Health>()
            .register_type::<Faction>()
            .register_type::<HealCooldown>();

        app.add_systems(FixedUpdate, health::tick_heal_cooldown.in_set(SimulationSet::Timers))
            .add_systems(
                FixedUpdate,
                health::reset_player_on_level_start.in_set(SimulationSet::Inversion),
            )
            .add_systems(FixedUpdate, health::process_heal_requests.in_set(SimulationSet::Actions))
            .add_systems(FixedUpdate, damage::apply_projectile_hits.in_set(SimulationSet::Damage))
            .add_systems(FixedUpdate, health::handle_deaths.in_set(SimulationSet::Reactions));
    }
}
