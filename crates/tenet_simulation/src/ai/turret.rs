//! Turret — компонент вражеской турели.

use bevy::prelude::*;

/// Турель: радиус обнаружения, окно автострельбы, точность
///
/// Точность растёт линейно от `base_accuracy` до `max_accuracy` за
/// `time_to_max_accuracy` секунд непрерывной стрельбы. Между окнами
/// сбрасывается на base.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Turret {
    pub detection_radius: f32,
    pub base_accuracy: f32,
    pub max_accuracy: f32,
    pub time_to_max_accuracy: f32,
    /// Длительность окна после последнего обнаружения
    pub auto_shoot_duration: f32,
    shoot_remaining: f32,
    shoot_elapsed: f32,
    accuracy: f32,
    aim_point: Option<Vec3>,
}

impl Default for Turret {
    fn default() -> Self {
        Self {
            detection_radius: 15.0,
            base_accuracy: 0.75,
            max_accuracy: 1.0,
            time_to_max_accuracy: 5.0,
            auto_shoot_duration: 20.0,
            shoot_remaining: 0.0,
            shoot_elapsed: 0.0,
            accuracy: 0.75,
            aim_point: None,
        }
    }
}

impl Turret {
    pub fn new(detection_radius: f32) -> Self {
        Self {
            detection_radius,
            ..Default::default()
        }
    }

    pub fn with_auto_shoot_duration(mut self, duration: f32) -> Self {
        self.auto_shoot_duration = duration;
        self
    }

    pub fn is_shooting(&self) -> bool {
        self.shoot_remaining > 0.0
    }

    pub fn accuracy(&self) -> f32 {
        self.accuracy
    }

    pub fn aim_point(&self) -> Option<Vec3> {
        self.aim_point
    }

    /// Открыть (продлить) окно автострельбы по позиции цели.
    ///
    /// Возвращает true если окно было закрыто.
    pub fn start_shooting_at(&mut self, target: Vec3) -> bool {
        let engaged = !self.is_shooting();
        self.shoot_remaining = self.auto_shoot_duration;
        self.aim_point = Some(target);
        engaged
    }

    /// Тик окна: точка прицеливания если турель стреляет в этом тике
    pub fn tick(&mut self, delta: f32) -> Option<Vec3> {
        if !self.is_shooting() {
            self.shoot_elapsed = 0.0;
            self.accuracy = self.base_accuracy;
            return None;
        }

        self.shoot_elapsed += delta;
        self.shoot_remaining -= delta;
        self.accuracy = self.accuracy_after(self.shoot_elapsed);
        self.aim_point
    }

    fn accuracy_after(&self, elapsed: f32) -> f32 {
        if self.time_to_max_accuracy <= 0.0 {
            return self.max_accuracy;
        }
        let ramp = elapsed / self.time_to_max_accuracy * (self.max_accuracy - self.base_accuracy);
        (self.base_accuracy + ramp).min(self.max_accuracy)
    }

    /// Доводка направления дула к цели: доля поворота = текущая точность
    pub fn aim(&self, forward: Vec3, desired: Vec3) -> Vec3 {
        let ratio = (self.accuracy / self.max_accuracy.max(f32::EPSILON)).clamp(0.0, 1.0);
        forward.lerp(desired, ratio).try_normalize().unwrap_or(desired)
    }
}
