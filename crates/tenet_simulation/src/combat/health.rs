//! Health, Faction и лечение игрока.

use bevy::prelude::*;

use crate::config::DifficultySettings;
use crate::inversion::{InversionRules, LevelEnded, LevelStarted, Session};
use crate::weapon::{Loadout, Weapon};

/// Сторона конфликта (кто кого может ранить)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
#[reflect(Component)]
pub enum Faction {
    Player,
    Enemy,
    #[default]
    Neutral,
}

impl Faction {
    /// Player ↔ Enemy; Neutral никого не ранит и не ранится
    pub fn is_hostile_to(&self, other: Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Player, Faction::Enemy) | (Faction::Enemy, Faction::Player)
        )
    }
}

/// Capability: всё, что можно ранить/лечить
pub trait Damageable {
    fn current_health(&self) -> f32;
    fn max_health(&self) -> f32;

    /// Возвращает здоровье после изменения
    fn damage(&mut self, amount: f32) -> f32;
    fn heal(&mut self, amount: f32) -> f32;

    fn damage_percent(&mut self, percent: f32) -> f32 {
        let amount = percent * self.max_health();
        self.damage(amount)
    }

    fn heal_percent(&mut self, percent: f32) -> f32 {
        let amount = percent * self.max_health();
        self.heal(amount)
    }
}

/// Здоровье entity (clamp в [0, max])
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Health {
    current: f32,
    max: f32,
    /// false = heal игнорируется (турели, мишени)
    pub can_heal: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            can_heal: true,
        }
    }

    pub fn without_healing(mut self) -> Self {
        self.can_heal = false;
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Новый максимум + полное здоровье (старт уровня)
    pub fn reset(&mut self, max: f32) {
        self.max = max;
        self.current = max;
    }
}

impl Damageable for Health {
    fn current_health(&self) -> f32 {
        self.current
    }

    fn max_health(&self) -> f32 {
        self.max
    }

    fn damage(&mut self, amount: f32) -> f32 {
        self.current = (self.current - amount).clamp(0.0, self.max);
        self.current
    }

    fn heal(&mut self, amount: f32) -> f32 {
        if self.can_heal {
            self.current = (self.current + amount).clamp(0.0, self.max);
        }
        self.current
    }
}

/// Компонент-маркер: entity мертв (Health == 0)
///
/// Деспавн не автоматический — решает host (death VFX, particles).
#[derive(Component, Debug)]
pub struct Dead;

/// Кулдаун лечения игрока (секунды). В Inverted течёт назад.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct HealCooldown {
    pub remaining: f32,
}

/// Event: здоровье изменилось
#[derive(Event, Debug, Clone, PartialEq)]
pub struct HealthChanged {
    pub entity: Entity,
    pub previous: f32,
    pub current: f32,
    /// Запрошенное изменение (до clamp)
    pub change: f32,
}

/// Event: entity умер (ровно один раз на переход в 0)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDied {
    pub entity: Entity,
}

/// Event (input): игрок хочет вылечиться
#[derive(Event, Debug, Clone, Copy)]
pub struct HealRequested {
    pub entity: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealFailReason {
    InvalidInversionState,
    InCooldown,
    InBlackout,
}

/// Event: лечение отклонено
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealFailed {
    pub entity: Entity,
    pub reason: HealFailReason,
}

/// Изменить здоровье и записать events (HealthChanged, EntityDied на переходе)
///
/// `amount < 0` = урон, `amount > 0` = лечение.
pub fn change_health(
    entity: Entity,
    health: &mut Health,
    amount: f32,
    changed: &mut EventWriter<HealthChanged>,
    died: &mut EventWriter<EntityDied>,
) -> f32 {
    if amount.abs() <= f32::EPSILON {
        return health.current();
    }

    let was_alive = health.is_alive();
    let previous = health.current();
    let current = if amount < 0.0 {
        health.damage(-amount)
    } else {
        health.heal(amount)
    };

    changed.write(HealthChanged {
        entity,
        previous,
        current,
        change: amount,
    });

    if was_alive && !health.is_alive() {
        crate::logger::log(&format!("💀 {:?} died", entity));
        died.write(EntityDied { entity });
    }
    current
}

/// Порядок проверок: cooldown → inversion state → blackout
pub fn check_heal(
    cooldown: &HealCooldown,
    can_heal_state: bool,
    weapon_in_blackout: bool,
) -> Result<(), HealFailReason> {
    if cooldown.remaining > 0.0 {
        return Err(HealFailReason::InCooldown);
    }
    if !can_heal_state {
        return Err(HealFailReason::InvalidInversionState);
    }
    if weapon_in_blackout {
        return Err(HealFailReason::InBlackout);
    }
    Ok(())
}

/// Система: HealRequested → heal или HealFailed
pub fn process_heal_requests(
    mut requests: EventReader<HealRequested>,
    mut players: Query<(&mut Health, &mut HealCooldown, Option<&Loadout>)>,
    weapons: Query<&Weapon>,
    session: Res<Session>,
    rules: Res<InversionRules>,
    settings: Res<DifficultySettings>,
    mut failed: EventWriter<HealFailed>,
    mut changed: EventWriter<HealthChanged>,
    mut died: EventWriter<EntityDied>,
) {
    let config = settings.current();

    for event in requests.read() {
        let Ok((mut health, mut cooldown, loadout)) = players.get_mut(event.entity) else {
            continue;
        };

        let in_blackout = loadout
            .and_then(Loadout::current)
            .and_then(|weapon| weapons.get(weapon).ok())
            .is_some_and(Weapon::is_blackout);

        match check_heal(&cooldown, rules.can_heal(session.current()), in_blackout) {
            Ok(()) => {
                let amount = config.player_heal_percent * health.max();
                change_health(event.entity, &mut health, amount, &mut changed, &mut died);
                cooldown.remaining = config.player_heal_cooldown;
                crate::logger::log(&format!("❤️ {:?} healed to {}", event.entity, health.current()));
            }
            Err(reason) => {
                failed.write(HealFailed {
                    entity: event.entity,
                    reason,
                });
            }
        }
    }
}

/// Система: heal cooldown через calculate_value (в Inverted растёт)
pub fn tick_heal_cooldown(
    mut cooldowns: Query<&mut HealCooldown>,
    session: Res<Session>,
    rules: Res<InversionRules>,
    settings: Res<DifficultySettings>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    let max = settings.current().player_heal_cooldown;

    for mut cooldown in cooldowns.iter_mut() {
        if cooldown.remaining > 0.0 {
            cooldown.remaining = rules.calculate_value(session.current(), cooldown.remaining, 0.0, max, delta);
        }
    }
}

/// Система: LevelStarted → max health игрока из сложности
pub fn reset_player_on_level_start(
    mut level_started: EventReader<LevelStarted>,
    mut players: Query<(&mut Health, Option<&mut HealCooldown>)>,
    session: Res<Session>,
    settings: Res<DifficultySettings>,
) {
    if level_started.read().count() == 0 {
        return;
    }
    let Some(player) = session.player() else {
        return;
    };
    if let Ok((mut health, cooldown)) = players.get_mut(player) {
        health.reset(settings.current().max_player_health);
        if let Some(mut cooldown) = cooldown {
            cooldown.remaining = 0.0;
        }
    }
}

/// Система: EntityDied → Dead marker; смерть игрока заканчивает уровень
pub fn handle_deaths(
    mut commands: Commands,
    mut died: EventReader<EntityDied>,
    session: Res<Session>,
    mut level_ended: EventWriter<LevelEnded>,
) {
    for event in died.read() {
        commands.entity(event.entity).try_insert(Dead);
        if session.player() == Some(event.entity) {
            crate::logger::log_info("💀 Player died: level failed");
            level_ended.write(LevelEnded { survived: false });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_rule() {
        assert!(Faction::Player.is_hostile_to(Faction::Enemy));
        assert!(Faction::Enemy.is_hostile_to(Faction::Player));
        assert!(!Faction::Enemy.is_hostile_to(Faction::Enemy));
        assert!(!Faction::Player.is_hostile_to(Faction::Neutral));
        assert!(!Faction::Neutral.is_hostile_to(Faction::Player));
    }

    #[test]
    fn test_health_clamps() {
        let mut health = Health::new(100.0);
        assert_eq!(health.damage(30.0), 70.0);
        assert_eq!(health.heal(50.0), 100.0);
        assert_eq!(health.damage(250.0), 0.0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_percent_uses_max() {
        let mut health = Health::new(50.0);
        assert_eq!(health.damage_percent(0.5), 25.0);
        assert_eq!(health.heal_percent(0.2), 35.0);
    }

    #[test]
    fn test_heal_ignored_when_disabled() {
        let mut health = Health::new(40.0).without_healing();
        health.damage(20.0);
        assert_eq!(health.heal(20.0), 20.0);
    }

    #[test]
    fn test_heal_check_order() {
        let ready = HealCooldown::default();
        let cooling = HealCooldown { remaining: 3.0 };

        assert_eq!(check_heal(&cooling, false, true), Err(HealFailReason::InCooldown));
        assert_eq!(check_heal(&ready, false, true), Err(HealFailReason::InvalidInversionState));
        assert_eq!(check_heal(&ready, true, true), Err(HealFailReason::InBlackout));
        assert_eq!(check_heal(&ready, true, false), Ok(()));
    }
}
