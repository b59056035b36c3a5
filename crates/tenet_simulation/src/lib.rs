//! Tenet Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: правила inversion-шутера без рендера и физики.
//!
//! HOST ARCHITECTURE:
//! - ECS = game state + правила (ammo, history markers, inversion, cover, турели)
//! - Host = физика, полёт projectile, анимации, звук
//! - Связь: events в обе стороны + SpatialOracle (raycast/overlap)

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod config;
pub mod cover;
pub mod history;
pub mod inversion;
pub mod logger;
pub mod spatial;
pub mod weapon;

// Re-export для удобства host'а
pub use ai::{AIPlugin, Turret, TurretEngaged};
pub use combat::{CombatPlugin, Damageable, Dead, EntityDied, Faction, HealCooldown, Health, ProjectileHit};
pub use config::{ConfigError, DifficultyConfig, DifficultySettings};
pub use cover::{CoverAnimation, CoverPlugin, CoverVisualChanged, DestructibleCover, RebuildTimeline};
pub use history::{HistoryMarkers, HistoryPlugin, HistoryTarget, MarkerChanged, MarkerId};
pub use inversion::{InversionPlugin, InversionRules, InversionState, InversionStateChanged, Session};
pub use spatial::{AimOrigin, SpatialOracle, SpatialOracleHandle};
pub use weapon::{Ammo, DamageType, DamageTypeFlags, Loadout, ProjectileSpawned, Weapon, WeaponPlugin};

/// Частота simulation tick
pub const SIMULATION_HZ: f64 = 60.0;

/// Фазы simulation tick (FixedUpdate, строго по порядку)
///
/// Timers → Inversion → Actions → Damage → Reactions
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Таймеры: blackout, heal cooldown, session, ребилд укрытий
    Timers,
    /// Смена InversionState, старт уровня
    Inversion,
    /// Input: турели, выстрел, перезарядка, смена оружия, лечение
    Actions,
    /// Попадания, drain
    Damage,
    /// Реакции на события этого тика (укрытия, смерть, подбор)
    Reactions,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .init_resource::<DifficultySettings>()
            .init_resource::<SpatialOracleHandle>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Timers,
                    SimulationSet::Inversion,
                    SimulationSet::Actions,
                    SimulationSet::Damage,
                    SimulationSet::Reactions,
                )
                    .chain(),
            )
            .add_plugins((
                InversionPlugin,
                HistoryPlugin,
                WeaponPlugin,
                CombatPlugin,
                CoverPlugin,
                AIPlugin,
            ));

        // Детерминистичный RNG: seed от create_headless_app имеет приоритет
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается ровно на один fixed tick за `app.update()` (не wall clock),
/// поэтому прогоны с одинаковым seed совпадают.
pub fn create_headless_app(seed: u64) -> App {
    logger::init_logger();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / SIMULATION_HZ,
        )));

    app
}

/// Snapshot компонента T по всем entity (сортировка по index)
pub fn world_snapshot<T>(world: &mut World) -> String
where
    T: Component + std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entries: Vec<_> = query
        .iter(world)
        .map(|(entity, component)| (entity.index(), format!("{:?}", component)))
        .collect();
    entries.sort_by_key(|(index, _)| *index);

    entries
        .into_iter()
        .map(|(index, component)| format!("{}:{}", index, component))
        .collect::<Vec<_>>()
        .join("\n")
}
