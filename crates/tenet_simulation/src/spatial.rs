//! Spatial oracle — граница с физикой хоста
//!
//! ECS не владеет коллайдерами: raycast и sphere overlap отвечает хост
//! (tactical layer). Симуляция получает только кандидатов (Entity) и точку попадания.
//! Trigger-сферы HistoryMarker и AmmoDrop принадлежат симуляции и
//! проверяются здесь же, без оракула.

use bevy::prelude::*;

/// Точка прицеливания (muzzle): позиция + направление вперёд
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AimOrigin {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for AimOrigin {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }
}

impl AimOrigin {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
        }
    }
}

/// Результат raycast от хоста
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Во что попали (None = статическая геометрия без ECS entity)
    pub entity: Option<Entity>,
}

/// Physics oracle (реализуется хостом)
pub trait SpatialOracle: Send + Sync {
    /// Raycast без ограничения дальности (включая trigger-коллайдеры)
    fn raycast(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;

    /// Все entity, чьи коллайдеры пересекают сферу
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity>;
}

/// Оракул по умолчанию: пустой мир
pub struct NullOracle;

impl SpatialOracle for NullOracle {
    fn raycast(&self, _origin: Vec3, _direction: Vec3) -> Option<RayHit> {
        None
    }

    fn overlap_sphere(&self, _center: Vec3, _radius: f32) -> Vec<Entity> {
        Vec::new()
    }
}

/// Оракул над фиксированной сценой: один заранее известный raycast hit
/// и набор сферических коллайдеров. Для headless прогонов и тестов.
#[derive(Debug, Clone, Default)]
pub struct StaticOracle {
    pub ray_hit: Option<RayHit>,
    pub colliders: Vec<(Entity, Vec3, f32)>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ray_hit(mut self, point: Vec3, entity: Option<Entity>) -> Self {
        self.ray_hit = Some(RayHit {
            point,
            normal: Vec3::Y,
            entity,
        });
        self
    }

    pub fn with_collider(mut self, entity: Entity, center: Vec3, radius: f32) -> Self {
        self.colliders.push((entity, center, radius));
        self
    }
}

impl SpatialOracle for StaticOracle {
    fn raycast(&self, _origin: Vec3, _direction: Vec3) -> Option<RayHit> {
        self.ray_hit
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.colliders
            .iter()
            .filter(|(_, position, extent)| spheres_overlap(center, radius, *position, *extent))
            .map(|(entity, _, _)| *entity)
            .collect()
    }
}

/// Resource: оракул, установленный хостом
#[derive(Resource)]
pub struct SpatialOracleHandle(pub Box<dyn SpatialOracle>);

impl Default for SpatialOracleHandle {
    fn default() -> Self {
        Self(Box::new(NullOracle))
    }
}

impl SpatialOracleHandle {
    pub fn new(oracle: impl SpatialOracle + 'static) -> Self {
        Self(Box::new(oracle))
    }

    pub fn oracle(&self) -> &dyn SpatialOracle {
        self.0.as_ref()
    }
}

/// Пересекаются ли две сферы (trigger-проверка без оракула)
pub fn spheres_overlap(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
    let reach = (radius_a + radius_b).max(0.0);
    a.distance_squared(b) <= reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spheres_overlap() {
        assert!(spheres_overlap(Vec3::ZERO, 1.0, Vec3::new(0.5, 0.0, 0.0), 0.0));
        assert!(spheres_overlap(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 0.5));
        assert!(!spheres_overlap(Vec3::ZERO, 1.0, Vec3::new(2.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_null_oracle_is_empty() {
        let handle = SpatialOracleHandle::default();
        assert!(handle.oracle().raycast(Vec3::ZERO, Vec3::Z).is_none());
        assert!(handle.oracle().overlap_sphere(Vec3::ZERO, 10.0).is_empty());
    }

    #[test]
    fn test_static_oracle_overlap() {
        let near = Entity::from_raw(1);
        let far = Entity::from_raw(2);
        let oracle = StaticOracle::new()
            .with_ray_hit(Vec3::X, Some(near))
            .with_collider(near, Vec3::ZERO, 0.5)
            .with_collider(far, Vec3::new(10.0, 0.0, 0.0), 0.5);

        assert_eq!(oracle.raycast(Vec3::ZERO, Vec3::Z).map(|hit| hit.point), Some(Vec3::X));
        assert_eq!(oracle.overlap_sphere(Vec3::new(1.0, 0.0, 0.0), 1.0), vec![near]);
    }

    #[test]
    fn test_aim_origin_normalizes_forward() {
        let aim = AimOrigin::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(aim.forward, Vec3::Z);
    }
}
