//! Pre-placed HistoryMarker (уровень стартует с "историей")

use bevy::prelude::*;
use rand::Rng;

use super::marker::{HistoryMarkers, MarkerId};
use crate::inversion::LevelStarted;
use crate::weapon::DamageType;
use crate::DeterministicRng;

/// Компонент: точка уровня, которая при старте порождает HistoryMarker
///
/// `DamageType::Random` резолвится через `DeterministicRng` (seed сессии).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct MarkerGenerator {
    pub damage_type: DamageType,
    pub trigger_radius: f32,
    /// Маркер, созданный при старте уровня
    pub generated: Option<MarkerId>,
}

impl Default for MarkerGenerator {
    fn default() -> Self {
        Self {
            damage_type: DamageType::Random,
            trigger_radius: 0.5,
            generated: None,
        }
    }
}

impl MarkerGenerator {
    pub fn new(damage_type: DamageType, trigger_radius: f32) -> Self {
        Self {
            damage_type,
            trigger_radius,
            generated: None,
        }
    }
}

/// Random → конкретный тип (Normal/Explosive), конкретный — как есть
pub fn resolve_damage_type<R: Rng + ?Sized>(damage_type: DamageType, rng: &mut R) -> DamageType {
    if damage_type.is_concrete() {
        return damage_type;
    }
    let index = rng.gen_range(0..DamageType::CONCRETE.len());
    DamageType::CONCRETE[index]
}

/// Система: LevelStarted → сгенерировать маркеры
///
/// Генератор с живым маркером пропускается (повторный LevelStarted не дублирует историю).
pub fn generate_markers(
    mut level_started: EventReader<LevelStarted>,
    mut generators: Query<(Entity, &Transform, &mut MarkerGenerator)>,
    mut markers: ResMut<HistoryMarkers>,
    mut rng: ResMut<DeterministicRng>,
) {
    if level_started.read().count() == 0 {
        return;
    }

    // Детерминизм: порядок обхода по Entity, не по archetype
    let mut ordered: Vec<_> = generators.iter_mut().collect();
    ordered.sort_by_key(|(entity, _, _)| *entity);

    for (entity, transform, mut generator) in ordered {
        if generator.generated.is_some_and(|id| markers.is_alive(id)) {
            continue;
        }

        let damage_type = resolve_damage_type(generator.damage_type, &mut rng.rng);
        let id = markers.record_hit(transform.translation, generator.trigger_radius, damage_type);
        generator.generated = Some(id);

        crate::logger::log(&format!(
            "🕓 Generator {:?} placed {:?} marker {:?}",
            entity, damage_type, id
        ));
    }
}
