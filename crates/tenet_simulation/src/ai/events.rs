//! AI Events — исходящие события турелей для host'а

use bevy::prelude::*;

/// Турель начала автострельбу (окно было закрыто)
///
/// Host: звук тревоги, разворот модели к `target_position`.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TurretEngaged {
    /// Entity турели (держатель Loadout)
    pub turret: Entity,
    /// Позиция игрока в момент обнаружения
    pub target_position: Vec3,
}
