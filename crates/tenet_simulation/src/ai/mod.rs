//! AI module — вражеские турели
//!
//! ECS ответственность: обнаружение игрока (радиус + line of sight через
//! SpatialOracle), окно автострельбы, рост точности, TriggerPulled.
//! Выстрел идёт тем же путём, что и у игрока: в Inverted турель "разстреливает"
//! свои маркеры обратно.
//!
//! Host ответственность: поворот модели турели, particles при смерти.

use bevy::prelude::*;

pub mod events;
pub mod systems;
pub mod turret;


pub use events::TurretEngaged;
pub use turret::Turret;

use crate::SimulationSet;

/// AI Plugin
///
/// Порядок выполнения (Actions, до process_trigger_pulls):
/// 1. detect_player — радиус + line of sight → окно автострельбы
/// 2. turret_fire — тик окна, доводка дула, TriggerPulled
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Turret>().add_event::<TurretEngaged>();

        app.add_systems(
            FixedUpdate,
            (systems::detect_player, systems::turret_fire)
                .chain()
                .in_set(SimulationSet::Actions)
                .before(crate::weapon::firing::process_trigger_pulls),
        );
    }
}
