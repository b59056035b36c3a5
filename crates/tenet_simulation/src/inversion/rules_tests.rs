//! Tests for InversionRules.

#[cfg(test)]
mod tests {
    use crate::config::DifficultyConfig;
    use crate::history::HistoryMarkers;
    use crate::inversion::{InversionRules, InversionState};
    use crate::spatial::{AimOrigin, NullOracle, StaticOracle};
    use crate::weapon::{Ammo, DamageType};
    use bevy::prelude::*;

    fn muzzle() -> AimOrigin {
        AimOrigin::new(Vec3::ZERO, Vec3::NEG_Z)
    }

    #[test]
    fn test_can_heal_only_in_normal() {
        let rules = InversionRules::new();
        assert!(rules.can_heal(InversionState::Normal));
        assert!(!rules.can_heal(InversionState::Inverted));
    }

    #[test]
    fn test_normal_always_allows_weapon() {
        let rules = InversionRules::new();
        let check = rules.can_use_weapon(
            InversionState::Normal,
            &Ammo::new(DamageType::Normal, 15, 15),
            &muzzle(),
            &NullOracle,
            &HistoryMarkers::new(),
            &[],
        );
        assert!(check.allowed);
        assert_eq!(check.marker, None);
        assert_eq!(check.ammo_drop, None);
    }

    #[test]
    fn test_inverted_picks_newest_marker() {
        let rules = InversionRules::new();
        let mut markers = HistoryMarkers::new();
        let point = Vec3::new(0.0, 0.0, -5.0);
        let older = markers.record_hit(point + Vec3::X * 0.4, 0.1, DamageType::Normal);
        let newer = markers.record_hit(point - Vec3::X * 0.4, 0.1, DamageType::Normal);
        let oracle = StaticOracle::new().with_ray_hit(point, None);
        let ammo = Ammo::new(DamageType::Normal, 15, 15);

        let check = rules.can_use_weapon(InversionState::Inverted, &ammo, &muzzle(), &oracle, &markers, &[]);
        assert!(check.allowed);
        assert_eq!(check.marker, Some(newer));

        // Свежая запись на старом маркере делает его "новейшим"
        markers.create_record(older);
        let check = rules.can_use_weapon(InversionState::Inverted, &ammo, &muzzle(), &oracle, &markers, &[]);
        assert_eq!(check.marker, Some(older));
    }

    #[test]
    fn test_inverted_requires_matching_damage_type() {
        let rules = InversionRules::new();
        let mut markers = HistoryMarkers::new();
        let point = Vec3::new(0.0, 0.0, -5.0);
        let explosive = markers.record_hit(point, 0.5, DamageType::Explosive);
        let oracle = StaticOracle::new().with_ray_hit(point, None);

        let check = rules.can_use_weapon(
            InversionState::Inverted,
            &Ammo::new(DamageType::Normal, 15, 15),
            &muzzle(),
            &oracle,
            &markers,
            &[],
        );
        assert!(!check.allowed);
        assert_eq!(check.marker, Some(explosive));
    }

    #[test]
    fn test_inverted_ignores_inactive_markers() {
        let rules = InversionRules::new();
        let mut markers = HistoryMarkers::new();
        let point = Vec3::new(0.0, 0.0, -5.0);
        let id = markers.record_hit(point, 0.5, DamageType::Normal);
        markers.set_active(id, false);
        let oracle = StaticOracle::new().with_ray_hit(point, None);

        let check = rules.can_use_weapon(
            InversionState::Inverted,
            &Ammo::new(DamageType::Normal, 15, 15),
            &muzzle(),
            &oracle,
            &markers,
            &[],
        );
        assert!(!check.allowed);
        assert_eq!(check.marker, None);
    }

    #[test]
    fn test_consume_ammo_inverted_releases_targets() {
        let rules = InversionRules::new();
        let mut markers = HistoryMarkers::new();
        let id = markers.record_hit(Vec3::new(0.0, 0.0, -4.0), 0.0, DamageType::Normal);
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);
        markers.last_record_mut(id).unwrap().add_target(a);
        markers.create_record(id).unwrap().add_target(b);
        markers.create_record(id).unwrap().add_target(a);

        let mut ammo = Ammo::new(DamageType::Normal, 15, 15);
        ammo.remove(15, false);
        let shooter = Entity::from_raw(3);

        let consumed = rules
            .consume_ammo(InversionState::Inverted, &mut ammo, &muzzle(), shooter, Some(id), &mut markers)
            .unwrap();

        assert_eq!(consumed.released, vec![a, b]);
        assert_eq!(consumed.restored, 3);
        assert_eq!(consumed.marker, Some((id, DamageType::Normal)));
        assert_eq!(consumed.projectile.position, Vec3::new(0.0, 0.0, -3.75));
        assert_eq!(ammo.current_count(), 3);
        assert!(markers.is_empty());
    }

    #[test]
    fn test_consume_ammo_inverted_dead_marker() {
        let rules = InversionRules::new();
        let mut markers = HistoryMarkers::new();
        let id = markers.record_hit(Vec3::ZERO, 0.0, DamageType::Normal);
        markers.dequeue_all(id);
        let mut ammo = Ammo::new(DamageType::Normal, 15, 15);

        let consumed = rules.consume_ammo(
            InversionState::Inverted,
            &mut ammo,
            &muzzle(),
            Entity::PLACEHOLDER,
            Some(id),
            &mut markers,
        );
        assert!(consumed.is_none());
        assert_eq!(ammo.current_count(), 15);
    }

    #[test]
    fn test_auto_reload_and_reload_flip_with_state() {
        let rules = InversionRules::new();
        let mut full = Ammo::new(DamageType::Normal, 15, 30);
        assert!(!rules.should_auto_reload(InversionState::Normal, &full));
        assert!(rules.should_auto_reload(InversionState::Inverted, &full));

        assert!(!rules.try_reload_ammo(InversionState::Normal, &mut full));
        assert!(rules.try_reload_ammo(InversionState::Inverted, &mut full));
        assert!(full.is_empty());
        assert_eq!(full.spare_count(), 30);

        assert!(rules.should_auto_reload(InversionState::Normal, &full));
        assert!(!rules.try_reload_ammo(InversionState::Inverted, &mut full));
    }

    #[test]
    fn test_calculate_value_runs_both_ways() {
        let rules = InversionRules::new();
        assert_eq!(rules.calculate_value(InversionState::Normal, 10.0, 0.0, 60.0, 1.0), 9.0);
        assert_eq!(rules.calculate_value(InversionState::Normal, 0.5, 0.0, 60.0, 1.0), 0.0);
        assert_eq!(rules.calculate_value(InversionState::Normal, 0.0, 0.0, 60.0, 1.0), 0.0);

        assert_eq!(rules.calculate_value(InversionState::Inverted, 10.0, 0.0, 60.0, 1.0), 11.0);
        assert_eq!(rules.calculate_value(InversionState::Inverted, 59.5, 0.0, 60.0, 1.0), 60.0);
        assert_eq!(rules.calculate_value(InversionState::Inverted, 70.0, 0.0, 60.0, 1.0), 70.0);
    }

    #[test]
    fn test_apply_effects_replaces_drain() {
        let mut rules = InversionRules::new();
        let config = DifficultyConfig::default();

        rules.apply_inversion_effects(InversionState::Inverted, &config);
        assert!(rules.drain().is_some());
        assert_eq!(rules.tick_drain(4.0), None);

        // Refresh: ожидание начинается заново
        rules.apply_inversion_effects(InversionState::Inverted, &config);
        assert_eq!(rules.tick_drain(4.0), None);
        assert_eq!(rules.tick_drain(1.0), Some((1, config.inversion_health_loss_percent)));

        rules.apply_inversion_effects(InversionState::Normal, &config);
        assert!(rules.drain().is_none());
        assert_eq!(rules.tick_drain(100.0), None);
    }

    #[test]
    fn test_ammo_drop_by_state() {
        let rules = InversionRules::new();
        let mut ammo = Ammo::new(DamageType::Normal, 15, 20);
        ammo.remove(10, false); // 5 / 15, spare 5

        rules.consume_ammo_drop(InversionState::Normal, 10, &mut ammo);
        assert_eq!(ammo.current_count(), 5);
        assert_eq!(ammo.spare_count(), 15);

        rules.consume_ammo_drop(InversionState::Inverted, 12, &mut ammo);
        assert_eq!(ammo.current_count(), 2);
        assert_eq!(ammo.spare_count(), 30);
    }
}
