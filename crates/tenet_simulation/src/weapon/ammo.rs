//! Ammo — двухпуловый счётчик (clip/spare) с inversion-aware мутацией.
//!
//! Normal: выстрел тратит clip, перезарядка тянет из spare.
//! Inverted: "выстрел" (поглощение HistoryMarker) добавляет патроны,
//! перезарядка выгружает clip обратно в spare.
//!
//! Transfer mode нужен для bulk-изменений (весь DequeueAll маркера одним вызовом):
//! current временно выходит за [0, clip], остаток складывается в spare
//! через floor-modulo.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Тип урона (закрытый enum)
///
/// `Random` допустим только в авторских данных (pre-placed маркеры) и
/// резолвится в конкретный тип через DeterministicRng.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Normal,
    Explosive,
    Random,
}

impl DamageType {
    /// Конкретные (не Random) типы
    pub const CONCRETE: [DamageType; 2] = [DamageType::Normal, DamageType::Explosive];

    pub fn is_concrete(&self) -> bool {
        *self != DamageType::Random
    }
}

/// Маленькое множество DamageType (linear scan — элементов максимум пара штук)
#[derive(Debug, Clone, Default, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct DamageTypeFlags {
    damage_types: Vec<DamageType>,
}

impl DamageTypeFlags {
    pub fn new(damage_types: impl IntoIterator<Item = DamageType>) -> Self {
        let mut flags = Self::default();
        for damage_type in damage_types {
            flags.insert(damage_type);
        }
        flags
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self::new(DamageType::CONCRETE)
    }

    pub fn insert(&mut self, damage_type: DamageType) -> bool {
        if self.has_flag(damage_type) {
            return false;
        }
        self.damage_types.push(damage_type);
        true
    }

    pub fn has_flag(&self, damage_type: DamageType) -> bool {
        self.damage_types.iter().any(|t| *t == damage_type)
    }

    pub fn is_empty(&self) -> bool {
        self.damage_types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DamageType> + '_ {
        self.damage_types.iter().copied()
    }
}

/// Патроны одного режима оружия
///
/// Инвариант: 0 ≤ current_count ≤ clip_count после каждого вызова.
/// spare_count ≥ 0 ожидается, но transfer-арифметика корректна и для
/// отрицательного остатка (spare может уйти в минус при underflow).
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Ammo {
    damage_type: DamageType,
    clip_count: i32,
    spare_count: i32,
    current_count: i32,

    /// Урон одного projectile
    pub damage: f32,
    /// Радиус trigger'а HistoryMarker, который создаёт попадание
    /// (0 = только прямое попадание, >0 = сферическая зона)
    pub trigger_radius: f32,
}

impl Ammo {
    /// Новый режим: spare = `max_spare`, затем clip заполняется из spare
    pub fn new(damage_type: DamageType, clip_count: i32, max_spare: i32) -> Self {
        let mut ammo = Self {
            damage_type,
            clip_count: clip_count.max(0),
            spare_count: max_spare,
            current_count: 0,
            damage: 10.0,
            trigger_radius: 0.0,
        };
        ammo.refill();
        ammo
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    pub fn with_trigger_radius(mut self, trigger_radius: f32) -> Self {
        self.trigger_radius = trigger_radius;
        self
    }

    /// Перезаписать счётчики из difficulty config
    pub fn configure(&mut self, in_clip: i32, total: i32) {
        self.current_count = in_clip.clamp(0, self.clip_count);
        self.spare_count = total;
        crate::logger::log(&format!(
            "Ammo {:?} configured: in clip = {}, spare = {}",
            self.damage_type, self.current_count, self.spare_count
        ));
    }

    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    pub fn clip_count(&self) -> i32 {
        self.clip_count
    }

    pub fn spare_count(&self) -> i32 {
        self.spare_count
    }

    pub fn current_count(&self) -> i32 {
        self.current_count
    }

    pub fn total(&self) -> i32 {
        self.current_count + self.spare_count
    }

    pub fn is_empty(&self) -> bool {
        self.current_count == 0
    }

    pub fn is_full(&self) -> bool {
        self.current_count == self.clip_count
    }

    /// Добавить в clip. Возвращает сколько реально добавлено.
    pub fn add(&mut self, delta: i32, transfer_overflow: bool) -> i32 {
        self.change_count(delta, transfer_overflow)
    }

    /// Убрать из clip. Возвращает сколько реально убрано (положительное число).
    pub fn remove(&mut self, delta: i32, transfer_underflow: bool) -> i32 {
        -self.change_count(-delta, transfer_underflow)
    }

    /// Пополнить запас (ammo drop в Normal)
    pub fn add_spare(&mut self, amount: i32) {
        self.spare_count += amount.max(0);
    }

    /// Normal reload: перелить из spare в clip сколько влезет
    pub fn refill(&mut self) {
        let wanted = (self.clip_count - self.current_count).clamp(0, self.spare_count.max(0));
        let added = self.add(wanted, false);
        self.spare_count -= added;
    }

    /// Inverted reload: патроны "текут назад" из clip в spare
    pub fn clear(&mut self) {
        let removed = self.remove(self.current_count, false);
        self.spare_count += removed;
    }

    /// Signed change. Non-transfer: зажимается в [0, clip], возвращается
    /// применённая часть. Transfer: применяется целиком, остаток уходит в spare.
    fn change_count(&mut self, change: i32, allow_transfer: bool) -> i32 {
        if allow_transfer {
            self.current_count += change;
            self.fold_into_spare();
            change
        } else {
            let applied = change.clamp(-self.current_count, self.clip_count - self.current_count);
            self.current_count += applied;
            applied
        }
    }

    /// Вернуть current в [0, clip], перекладывая целые обоймы в/из spare.
    ///
    /// Overflow: в clip остаётся `current mod clip`.
    /// Underflow: из spare занимаются целые обоймы, в clip остаётся
    /// `current mod clip` (или полная обойма, если остаток 0).
    fn fold_into_spare(&mut self) {
        if self.clip_count <= 0 {
            self.spare_count += self.current_count;
            self.current_count = 0;
            return;
        }

        if self.current_count > self.clip_count {
            let kept = self.current_count.rem_euclid(self.clip_count);
            self.spare_count += self.current_count - kept;
            self.current_count = kept;
        } else if self.current_count < 0 {
            let mut kept = self.current_count.rem_euclid(self.clip_count);
            if kept == 0 {
                kept = self.clip_count;
            }
            self.spare_count += self.current_count - kept;
            self.current_count = kept;
        }
    }
}
