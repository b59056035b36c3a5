//! Session — авторитетное состояние inversion на время уровня.

use bevy::prelude::*;

use super::state::InversionState;

/// Resource: текущее InversionState, разрешённое целевое состояние, таймер
#[derive(Resource, Debug, Clone, Default)]
pub struct Session {
    current: InversionState,
    can_invert_target: Option<InversionState>,
    state_duration: f32,
    player: Option<Entity>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> InversionState {
        self.current
    }

    pub fn can_invert_target(&self) -> Option<InversionState> {
        self.can_invert_target
    }

    /// Секунды с последнего переключения/refresh
    pub fn state_duration(&self) -> f32 {
        self.state_duration
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    pub fn set_player(&mut self, player: Entity) {
        self.player = Some(player);
    }

    /// Разрешить/запретить переключение. Учитывается только collider игрока.
    ///
    /// Возвращает true если target реально изменился.
    pub fn set_invertability(&mut self, target: Option<InversionState>, collider: Entity) -> bool {
        if self.player != Some(collider) || self.can_invert_target == target {
            return false;
        }
        self.can_invert_target = target;
        true
    }

    /// Переключиться в разрешённое состояние. None если переключение запрещено.
    pub fn activate_inversion(&mut self) -> Option<InversionState> {
        let target = self.can_invert_target?;
        let previous = self.current;
        self.current = target;
        self.state_duration = 0.0;
        Some(previous)
    }

    /// Перезапуск таймера без смены состояния
    pub fn refresh(&mut self) {
        self.state_duration = 0.0;
    }

    pub fn tick(&mut self, delta: f32) {
        self.state_duration += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invertability_only_for_player() {
        let mut session = Session::new();
        let player = Entity::from_raw(1);
        let stranger = Entity::from_raw(2);
        session.set_player(player);

        assert!(!session.set_invertability(Some(InversionState::Inverted), stranger));
        assert_eq!(session.can_invert_target(), None);

        assert!(session.set_invertability(Some(InversionState::Inverted), player));
        assert!(!session.set_invertability(Some(InversionState::Inverted), player));
        assert_eq!(session.can_invert_target(), Some(InversionState::Inverted));
    }

    #[test]
    fn test_activate_requires_target() {
        let mut session = Session::new();
        assert_eq!(session.activate_inversion(), None);
        assert_eq!(session.current(), InversionState::Normal);
    }

    #[test]
    fn test_activate_switches_and_restarts_timer() {
        let mut session = Session::new();
        let player = Entity::from_raw(1);
        session.set_player(player);
        session.set_invertability(Some(InversionState::Inverted), player);
        session.tick(3.0);

        assert_eq!(session.activate_inversion(), Some(InversionState::Normal));
        assert_eq!(session.current(), InversionState::Inverted);
        assert_eq!(session.state_duration(), 0.0);

        session.tick(1.5);
        session.refresh();
        assert_eq!(session.state_duration(), 0.0);
        assert_eq!(session.current(), InversionState::Inverted);
    }
}
