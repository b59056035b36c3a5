//! HistoryTarget — какие маркеры сейчас "висят" на entity.

use bevy::prelude::*;

use super::marker::{HistoryMarkers, MarkerId};
use crate::weapon::{DamageType, DamageTypeFlags};

/// Компонент: набор (MarkerId, DamageType), зарегистрированных на entity
///
/// Регистрация/снятие идемпотентны; `MarkerChanged` пишется только
/// при реальном изменении набора (edge-triggered).
#[derive(Component, Debug, Clone, Default)]
pub struct HistoryTarget {
    markers: Vec<(MarkerId, DamageType)>,
}

impl HistoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// true только при первом добавлении
    pub fn register_marker(&mut self, id: MarkerId, damage_type: DamageType) -> bool {
        if self.contains(id) {
            return false;
        }
        self.markers.push((id, damage_type));
        true
    }

    /// true только если маркер действительно был зарегистрирован
    pub fn unregister_marker(&mut self, id: MarkerId) -> bool {
        let before = self.markers.len();
        self.markers.retain(|(registered, _)| *registered != id);
        self.markers.len() != before
    }

    pub fn contains(&self, id: MarkerId) -> bool {
        self.markers.iter().any(|(registered, _)| *registered == id)
    }

    pub fn markers(&self) -> &[(MarkerId, DamageType)] {
        &self.markers
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Есть ли маркер хотя бы одного типа из фильтра
    pub fn has_damage_type(&self, filter: &DamageTypeFlags) -> bool {
        self.markers
            .iter()
            .any(|(_, damage_type)| filter.has_flag(*damage_type))
    }

    /// Включить/выключить trigger всех зарегистрированных маркеров
    pub fn enable(&self, enabled: bool, markers: &mut HistoryMarkers) {
        for (id, _) in &self.markers {
            markers.set_active(*id, enabled);
        }
    }

    /// Убрать маркеры, умершие без явного unregister
    pub fn prune_dead(&mut self, markers: &HistoryMarkers) -> Vec<(MarkerId, DamageType)> {
        let mut removed = Vec::new();
        self.markers.retain(|entry| {
            let alive = markers.is_alive(entry.0);
            if !alive {
                removed.push(*entry);
            }
            alive
        });
        removed
    }
}

/// Event: набор маркеров HistoryTarget изменился
#[derive(Event, Debug, Clone, PartialEq)]
pub struct MarkerChanged {
    pub target: Entity,
    pub marker: MarkerId,
    pub damage_type: DamageType,
    /// true = зарегистрирован, false = снят
    pub added: bool,
}
