//! InversionRules — правила, которые меняют смысл при смене InversionState
//!
//! Normal: выстрел тратит патрон и оставляет HistoryMarker там, куда попал.
//! Inverted: выстрел "забирает" пулю обратно из маркера (DequeueAll),
//! патроны возвращаются в обойму, projectile летит от маркера к стрелку.
//!
//! Все методы — чистая логика над переданным состоянием (без ECS доступа),
//! системы в `inversion::mod` / `weapon::firing` только маршрутизируют events.

use bevy::prelude::*;

use super::drain::InversionDrain;
use super::state::InversionState;
use crate::config::DifficultyConfig;
use crate::history::{HistoryMarkers, MarkerId, EMPTY_TIMESTAMP};
use crate::spatial::{spheres_overlap, AimOrigin, SpatialOracle};
use crate::weapon::{Ammo, AmmoDropSite, DamageType};

/// Радиус поиска маркеров/ammo drop в точке попадания inverted-луча
pub const INVERSION_QUERY_RADIUS: f32 = 1.0;

/// Смещение reversed projectile от маркера (не задеть исходную цель)
pub const REVERSE_SPAWN_OFFSET: f32 = 0.25;

/// Результат `can_use_weapon`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeaponCheck {
    pub allowed: bool,
    pub marker: Option<MarkerId>,
    pub ammo_drop: Option<Entity>,
}

impl WeaponCheck {
    fn free() -> Self {
        Self {
            allowed: true,
            ..Default::default()
        }
    }

    fn denied() -> Self {
        Self::default()
    }
}

/// Куда и как запустить projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub position: Vec3,
    pub direction: Vec3,
    /// Inverted: projectile возвращается к стрелку
    pub homing_target: Option<Entity>,
    pub reversed: bool,
}

/// Результат `consume_ammo`
#[derive(Debug, Clone, PartialEq)]
pub struct AmmoConsumed {
    pub projectile: ProjectileLaunch,
    /// Inverted: цели, с которых надо снять маркер (unregister)
    pub released: Vec<Entity>,
    /// Inverted: сколько патронов вернулось
    pub restored: i32,
    /// Inverted: поглощённый (уже мёртвый) маркер
    pub marker: Option<(MarkerId, DamageType)>,
}

/// Resource: правила inversion + активная drain-задача
#[derive(Resource, Debug, Default)]
pub struct InversionRules {
    drain: Option<InversionDrain>,
}

impl InversionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_heal(&self, state: InversionState) -> bool {
        state == InversionState::Normal
    }

    /// Может ли оружие выстрелить в текущем состоянии
    ///
    /// Inverted: луч вперёд от muzzle, в точке попадания ищем ammo drop
    /// (приоритет) или самый свежий маркер. Маркер годится только если его
    /// DamageType совпадает с патронами.
    pub fn can_use_weapon(
        &self,
        state: InversionState,
        ammo: &Ammo,
        muzzle: &AimOrigin,
        oracle: &dyn SpatialOracle,
        markers: &HistoryMarkers,
        drops: &[AmmoDropSite],
    ) -> WeaponCheck {
        if state == InversionState::Normal {
            return WeaponCheck::free();
        }

        let Some(hit) = oracle.raycast(muzzle.position, muzzle.forward) else {
            return WeaponCheck::denied();
        };

        if let Some(drop) = drops
            .iter()
            .find(|drop| spheres_overlap(hit.point, INVERSION_QUERY_RADIUS, drop.position, drop.radius))
        {
            return WeaponCheck {
                allowed: true,
                marker: None,
                ammo_drop: Some(drop.entity),
            };
        }

        // Самый свежий по last timestamp, при равенстве — позже созданный
        let newest = markers
            .overlapping(hit.point, INVERSION_QUERY_RADIUS)
            .filter(|(_, marker)| marker.last_timestamp() > EMPTY_TIMESTAMP)
            .max_by_key(|(_, marker)| (marker.last_timestamp(), marker.created()));

        match newest {
            Some((id, marker)) => {
                let allowed = marker.damage_type() == ammo.damage_type();
                if !allowed {
                    crate::logger::log(&format!(
                        "Marker {:?} is {:?}, ammo is {:?}: withheld",
                        id,
                        marker.damage_type(),
                        ammo.damage_type()
                    ));
                }
                WeaponCheck {
                    allowed,
                    marker: Some(id),
                    ammo_drop: None,
                }
            }
            None => WeaponCheck::denied(),
        }
    }

    /// Потратить (Normal) или вернуть (Inverted) патроны
    ///
    /// Inverted требует живой маркер; None если маркер уже умер.
    pub fn consume_ammo(
        &self,
        state: InversionState,
        ammo: &mut Ammo,
        muzzle: &AimOrigin,
        shooter: Entity,
        marker: Option<MarkerId>,
        markers: &mut HistoryMarkers,
    ) -> Option<AmmoConsumed> {
        match state {
            InversionState::Normal => {
                ammo.remove(1, false);
                Some(AmmoConsumed {
                    projectile: ProjectileLaunch {
                        position: muzzle.position,
                        direction: muzzle.forward,
                        homing_target: None,
                        reversed: false,
                    },
                    released: Vec::new(),
                    restored: 0,
                    marker: None,
                })
            }
            InversionState::Inverted => {
                let id = marker?;
                let history = markers.get(id)?;
                let origin = history.position();
                let damage_type = history.damage_type();

                let mut released: Vec<Entity> = Vec::new();
                for record in history.records() {
                    for target in record.affected_targets() {
                        if !released.contains(target) {
                            released.push(*target);
                        }
                    }
                }

                let count = markers.dequeue_all(id)? as i32;
                let direction = (muzzle.position - origin).normalize_or_zero();
                ammo.add(count, true);

                Some(AmmoConsumed {
                    projectile: ProjectileLaunch {
                        position: origin + direction * REVERSE_SPAWN_OFFSET,
                        direction,
                        homing_target: Some(shooter),
                        reversed: true,
                    },
                    released,
                    restored: count,
                    marker: Some((id, damage_type)),
                })
            }
        }
    }

    /// Normal: пустая обойма. Inverted: полная (некуда возвращать патроны).
    pub fn should_auto_reload(&self, state: InversionState, ammo: &Ammo) -> bool {
        match state {
            InversionState::Normal => ammo.is_empty(),
            InversionState::Inverted => ammo.is_full(),
        }
    }

    /// Normal: refill (если не полная). Inverted: clear (если не пустая).
    pub fn try_reload_ammo(&self, state: InversionState, ammo: &mut Ammo) -> bool {
        match state {
            InversionState::Normal if !ammo.is_full() => {
                ammo.refill();
                true
            }
            InversionState::Inverted if !ammo.is_empty() => {
                ammo.clear();
                true
            }
            _ => false,
        }
    }

    /// Таймер, который в Inverted течёт назад (heal cooldown)
    pub fn calculate_value(&self, state: InversionState, value: f32, min: f32, max: f32, delta: f32) -> f32 {
        match state {
            InversionState::Normal if value > min => (value - delta).clamp(0.0, max),
            InversionState::Inverted if value <= max => (value + delta).clamp(0.0, max),
            _ => value,
        }
    }

    /// Отменить текущий drain; в Inverted запустить новый
    pub fn apply_inversion_effects(&mut self, state: InversionState, config: &DifficultyConfig) {
        self.drain = match state {
            InversionState::Normal => None,
            InversionState::Inverted => Some(InversionDrain::from_config(config)),
        };
    }

    pub fn drain(&self) -> Option<&InversionDrain> {
        self.drain.as_ref()
    }

    /// Продвинуть drain; возвращает (pulses, percent за pulse)
    pub fn tick_drain(&mut self, delta: f32) -> Option<(u32, f32)> {
        let drain = self.drain.as_mut()?;
        let pulses = drain.tick(delta);
        (pulses > 0).then(|| (pulses, drain.percent()))
    }

    /// Подбор ammo drop: Normal — в запас, Inverted — прямо в обойму (transfer)
    pub fn consume_ammo_drop(&self, state: InversionState, amount: i32, ammo: &mut Ammo) {
        match state {
            InversionState::Normal => {
                ammo.add_spare(amount);
            }
            InversionState::Inverted => {
                ammo.add(amount, true);
            }
        }
    }
}
