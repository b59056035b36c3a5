//! HistoryMarker arena — "undo log" попаданий по локациям.
//!
//! Маркер = позиция + trigger-сфера + DamageType + LIFO стек HistoryRecord.
//! Маркеры живут в `HistoryMarkers` (generational arena) и адресуются через
//! `MarkerId`. Пустой маркер не существует: снятие последней записи освобождает
//! слот и увеличивает generation, так что все старые `MarkerId` становятся
//! мёртвыми и это детектируется (а не висит dangling ссылкой).

use bevy::prelude::*;

use crate::spatial::spheres_overlap;
use crate::weapon::DamageType;

/// Generation-tagged handle маркера
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct MarkerId {
    index: u32,
    generation: u32,
}

impl MarkerId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Timestamp-sentinel "пустой записи": строго старше любой реальной
pub const EMPTY_TIMESTAMP: u64 = 0;

/// Запись об одном попадании
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    timestamp: u64,
    affected_targets: Vec<Entity>,
    consumed: bool,
}

impl HistoryRecord {
    fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            affected_targets: Vec::new(),
            consumed: false,
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn affected_targets(&self) -> &[Entity] {
        &self.affected_targets
    }

    /// Добавить цель (уникально). true если добавлена впервые.
    pub fn add_target(&mut self, target: Entity) -> bool {
        if self.affected_targets.contains(&target) {
            return false;
        }
        self.affected_targets.push(target);
        true
    }

    fn consume(mut self) -> Self {
        self.consumed = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HistoryMarker {
    position: Vec3,
    trigger_radius: f32,
    damage_type: DamageType,
    records: Vec<HistoryRecord>,
    active: bool,
    created: u64,
}

impl HistoryMarker {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn trigger_radius(&self) -> f32 {
        self.trigger_radius
    }

    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Порядковый номер создания (tie-break "свежее создан")
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Записи от старой к новой
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn last_record(&self) -> Option<&HistoryRecord> {
        self.records.last()
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_record().map_or(EMPTY_TIMESTAMP, HistoryRecord::timestamp)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    marker: Option<HistoryMarker>,
}

/// Resource: все живые HistoryMarker сессии
#[derive(Resource, Debug, Default)]
pub struct HistoryMarkers {
    slots: Vec<Slot>,
    free: Vec<u32>,
    clock: u64,
    live: usize,
}

impl HistoryMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Количество живых маркеров
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_alive(&self, id: MarkerId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: MarkerId) -> Option<&HistoryMarker> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.marker.as_ref())
    }

    fn get_mut(&mut self, id: MarkerId) -> Option<&mut HistoryMarker> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.marker.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &HistoryMarker)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.marker.as_ref().map(|marker| {
                (
                    MarkerId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    marker,
                )
            })
        })
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Попадание в точку: переиспользовать ближайший маркер того же типа
    /// (или создать новый) и положить на него свежую запись.
    pub fn record_hit(&mut self, position: Vec3, trigger_radius: f32, damage_type: DamageType) -> MarkerId {
        let id = match self.find_nearest(position, trigger_radius, damage_type) {
            Some(existing) => existing,
            None => self.spawn(position, trigger_radius, damage_type),
        };

        let timestamp = self.tick();
        if let Some(marker) = self.get_mut(id) {
            marker.records.push(HistoryRecord::new(timestamp));
        }
        id
    }

    fn spawn(&mut self, position: Vec3, trigger_radius: f32, damage_type: DamageType) -> MarkerId {
        let created = self.tick();
        let marker = HistoryMarker {
            position,
            trigger_radius: trigger_radius.max(0.0),
            damage_type,
            records: Vec::new(),
            active: true,
            created,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].marker = Some(marker);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    marker: Some(marker),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.live += 1;

        let id = MarkerId {
            index,
            generation: self.slots[index as usize].generation,
        };
        crate::logger::log(&format!(
            "🕓 HistoryMarker {:?} created at {:?} ({:?}, r={})",
            id, position, damage_type, trigger_radius
        ));
        id
    }

    fn destroy(&mut self, id: MarkerId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation || slot.marker.take().is_none() {
            return;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        crate::logger::log(&format!("🕓 HistoryMarker {:?} destroyed", id));
    }

    /// Новая запись на живом маркере (None для мёртвого id)
    pub fn create_record(&mut self, id: MarkerId) -> Option<&mut HistoryRecord> {
        if !self.is_alive(id) {
            return None;
        }
        let timestamp = self.tick();
        let marker = self.get_mut(id)?;
        marker.records.push(HistoryRecord::new(timestamp));
        marker.records.last_mut()
    }

    pub fn last_record(&self, id: MarkerId) -> Option<&HistoryRecord> {
        self.get(id)?.last_record()
    }

    pub fn last_record_mut(&mut self, id: MarkerId) -> Option<&mut HistoryRecord> {
        self.get_mut(id)?.records.last_mut()
    }

    /// Timestamp верхней записи, `EMPTY_TIMESTAMP` для мёртвого id
    pub fn last_timestamp(&self, id: MarkerId) -> u64 {
        self.get(id).map_or(EMPTY_TIMESTAMP, HistoryMarker::last_timestamp)
    }

    /// Снять верхнюю запись (consumed = true). Пустой маркер уничтожается.
    pub fn dequeue(&mut self, id: MarkerId) -> Option<HistoryRecord> {
        let marker = self.get_mut(id)?;
        let record = marker.records.pop()?.consume();
        if marker.records.is_empty() {
            self.destroy(id);
        }
        Some(record)
    }

    /// Снять все записи, вернуть их количество. Маркер уничтожается всегда.
    pub fn dequeue_all(&mut self, id: MarkerId) -> Option<usize> {
        let marker = self.get_mut(id)?;
        let count = marker.records.len();
        marker.records.clear();
        crate::logger::log(&format!("Removed all {} records from marker {:?}", count, id));
        self.destroy(id);
        Some(count)
    }

    /// Включить/выключить trigger-детекцию без уничтожения маркера
    pub fn set_active(&mut self, id: MarkerId, active: bool) -> bool {
        match self.get_mut(id) {
            Some(marker) => {
                marker.active = active;
                true
            }
            None => false,
        }
    }

    /// Ближайший живой маркер того же DamageType, чья trigger-сфера
    /// пересекает сферу запроса. Tie-break — минимальный квадрат расстояния.
    pub fn find_nearest(&self, location: Vec3, radius: f32, damage_type: DamageType) -> Option<MarkerId> {
        self.iter()
            .filter(|(_, marker)| marker.damage_type == damage_type)
            .filter(|(_, marker)| spheres_overlap(location, radius, marker.position, marker.trigger_radius))
            .map(|(id, marker)| (id, marker.position.distance_squared(location)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Живые и активные маркеры, пересекающие сферу запроса (trigger detection)
    pub fn overlapping(&self, point: Vec3, radius: f32) -> impl Iterator<Item = (MarkerId, &HistoryMarker)> {
        self.iter()
            .filter(move |(_, marker)| marker.active)
            .filter(move |(_, marker)| spheres_overlap(point, radius, marker.position, marker.trigger_radius))
    }
}
