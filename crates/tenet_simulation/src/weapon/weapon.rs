//! Weapon component + Loadout (набор оружия у holder'а)

use bevy::prelude::*;

use super::ammo::Ammo;
use crate::spatial::AimOrigin;

/// Blackout по умолчанию (секунды), до множителя сложности
pub const DEFAULT_BLACKOUT_DURATION: f32 = 0.75;

/// Оружие (отдельная entity, holder — владелец Loadout)
///
/// Режимы = набор Ammo; активен ровно один (`mode`).
/// Blackout блокирует любые действия оружием (выстрел, перезарядка, heal).
#[derive(Component, Debug, Clone)]
pub struct Weapon {
    pub holder: Entity,
    pub name: String,
    modes: Vec<Ammo>,
    mode: usize,
    /// Точка вылета projectile (обновляется хостом)
    pub muzzle: AimOrigin,
    pub blackout_duration: f32,
    blackout_remaining: f32,
    active: bool,
}

impl Weapon {
    pub fn new(holder: Entity, name: impl Into<String>, primary: Ammo) -> Self {
        Self {
            holder,
            name: name.into(),
            modes: vec![primary],
            mode: 0,
            muzzle: AimOrigin::default(),
            blackout_duration: DEFAULT_BLACKOUT_DURATION,
            blackout_remaining: 0.0,
            active: false,
        }
    }

    pub fn with_mode(mut self, ammo: Ammo) -> Self {
        self.modes.push(ammo);
        self
    }

    pub fn with_muzzle(mut self, muzzle: AimOrigin) -> Self {
        self.muzzle = muzzle;
        self
    }

    pub fn with_blackout_duration(mut self, duration: f32) -> Self {
        self.blackout_duration = duration.max(0.0);
        self
    }

    /// Патроны активного режима
    pub fn ammo(&self) -> &Ammo {
        &self.modes[self.mode]
    }

    pub fn ammo_mut(&mut self) -> &mut Ammo {
        &mut self.modes[self.mode]
    }

    pub fn modes(&self) -> &[Ammo] {
        &self.modes
    }

    pub fn mode(&self) -> usize {
        self.mode
    }

    /// Сменить режим (индекс зажимается). true если режим изменился.
    pub fn set_mode(&mut self, mode: usize) -> bool {
        let mode = mode.min(self.modes.len() - 1);
        if mode == self.mode {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_blackout(&self) -> bool {
        self.blackout_remaining > 0.0
    }

    pub fn blackout_remaining(&self) -> f32 {
        self.blackout_remaining
    }

    /// Запустить blackout (перезапускает, если уже идёт)
    pub fn start_blackout(&mut self, multiplier: f32) {
        self.blackout_remaining = self.blackout_duration * multiplier.max(0.0);
    }

    /// Возвращает true на тике, где blackout закончился
    pub fn tick_blackout(&mut self, delta: f32) -> bool {
        if self.blackout_remaining <= 0.0 {
            return false;
        }
        self.blackout_remaining = (self.blackout_remaining - delta).max(0.0);
        self.blackout_remaining == 0.0
    }

    /// Активировать/деактивировать. Активация всегда даёт blackout.
    pub fn activate(&mut self, active: bool, blackout_multiplier: f32) {
        if self.active == active {
            return;
        }
        self.active = active;
        if active {
            self.start_blackout(blackout_multiplier);
        } else {
            self.blackout_remaining = 0.0;
        }
    }
}

/// Компонент holder'а: список weapon entities + текущее
#[derive(Component, Debug, Clone, Default)]
pub struct Loadout {
    weapons: Vec<Entity>,
    current: Option<usize>,
}

impl Loadout {
    pub fn new(weapons: Vec<Entity>) -> Self {
        Self {
            weapons,
            current: None,
        }
    }

    pub fn weapons(&self) -> &[Entity] {
        &self.weapons
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<Entity> {
        self.current.and_then(|index| self.weapons.get(index).copied())
    }

    /// Индекс следующего оружия (по кругу)
    pub fn next_index(&self) -> usize {
        match self.current {
            Some(index) if index + 1 < self.weapons.len() => index + 1,
            _ => 0,
        }
    }

    /// Выбрать оружие. Some((previous, new)) если выбор изменился.
    pub fn select(&mut self, index: usize) -> Option<(Option<Entity>, Entity)> {
        if self.weapons.is_empty() {
            return None;
        }
        let index = index.min(self.weapons.len() - 1);
        if self.current == Some(index) {
            return None;
        }
        let previous = self.current();
        self.current = Some(index);
        Some((previous, self.weapons[index]))
    }
}
