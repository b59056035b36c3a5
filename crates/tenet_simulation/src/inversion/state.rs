//! InversionState + events inversion-слоя

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Глобальное направление времени
///
/// Единственный авторитетный экземпляр — `Session::current()`.
/// Entities не хранят копию, а читают ресурс.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum InversionState {
    #[default]
    Normal,
    Inverted,
}

impl InversionState {
    pub fn is_inverted(&self) -> bool {
        *self == InversionState::Inverted
    }
}

/// Event (input): игрок нажал "inversion"
#[derive(Event, Debug, Clone, Copy)]
pub struct InversionRequested;

/// Event (input): collider вошёл в inversion-зону (turnstile)
#[derive(Event, Debug, Clone, Copy)]
pub struct InversionVolumeEntered {
    pub target_state: InversionState,
    pub collider: Entity,
}

/// Event (input): collider вышел из inversion-зоны
#[derive(Event, Debug, Clone, Copy)]
pub struct InversionVolumeExited {
    pub collider: Entity,
}

/// Event (output): состояние переключено
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InversionStateChanged {
    pub previous: InversionState,
    pub current: InversionState,
}

/// Event (input): хост загрузил уровень
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct LevelStarted;

/// Event (output): уровень закончен
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelEnded {
    pub survived: bool,
}
