//! Difficulty configuration
//!
//! Таблица сложностей грузится внешней config-машинерией (TOML) и валидируется
//! один раз при старте. Текущая сложность — ресурс `DifficultySettings`,
//! который `SimulationPlugin` вставляет в World (никаких глобальных синглтонов).

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

mod error;

pub use error::ConfigError;

/// Инклюзивный диапазон целых (стартовые патроны оружия)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i32,
    pub max: i32,
}

impl IntRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn fixed(value: i32) -> Self {
        Self::new(value, value)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Стартовое состояние патронов для конкретного оружия (по имени)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub weapon: String,
    pub start_in_clip: IntRange,
    pub start_total: IntRange,
}

/// Параметры одной сложности
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub name: String,

    pub max_player_health: f32,
    /// Секунды
    pub player_heal_cooldown: f32,
    /// Доля от max health (0.5 = половина)
    pub player_heal_percent: f32,

    /// Множитель blackout после выстрела/перезарядки
    pub weapon_blackout_multiplier: f32,

    /// Сколько секунд Inverted безопасен до начала drain
    pub inversion_max_duration: f32,
    /// Доля max health за один pulse
    pub inversion_health_loss_percent: f32,
    /// Секунды между pulse
    pub inversion_health_loss_interval: f32,

    pub weapons: Vec<WeaponConfig>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            name: "Normal".to_string(),
            max_player_health: 100.0,
            player_heal_cooldown: 60.0,
            player_heal_percent: 0.5,
            weapon_blackout_multiplier: 1.0,
            inversion_max_duration: 5.0,
            inversion_health_loss_percent: 0.02,
            inversion_health_loss_interval: 1.0,
            weapons: Vec::new(),
        }
    }
}

impl DifficultyConfig {
    pub fn weapon_config(&self, weapon: &str) -> Option<&WeaponConfig> {
        self.weapons.iter().find(|w| w.weapon == weapon)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_player_health", self.max_player_health),
            ("inversion_health_loss_interval", self.inversion_health_loss_interval),
        ];
        let non_negative = [
            ("player_heal_cooldown", self.player_heal_cooldown),
            ("player_heal_percent", self.player_heal_percent),
            ("weapon_blackout_multiplier", self.weapon_blackout_multiplier),
            ("inversion_max_duration", self.inversion_max_duration),
            ("inversion_health_loss_percent", self.inversion_health_loss_percent),
        ];

        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(self.invalid(field, value));
            }
        }
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(self.invalid(field, value));
            }
        }

        for weapon in &self.weapons {
            for range in [weapon.start_in_clip, weapon.start_total] {
                if range.min > range.max {
                    return Err(ConfigError::InvalidRange {
                        difficulty: self.name.clone(),
                        weapon: weapon.weapon.clone(),
                        min: range.min,
                        max: range.max,
                    });
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, field: &'static str, value: f32) -> ConfigError {
        ConfigError::InvalidValue {
            difficulty: self.name.clone(),
            field,
            value,
        }
    }
}

/// TOML-представление таблицы сложностей
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyTable {
    #[serde(default)]
    pub default_difficulty: usize,
    pub difficulties: Vec<DifficultyConfig>,
}

/// Resource: провалидированная таблица + выбранная сложность
///
/// Инвариант: таблица непустая, `current < difficulties.len()`.
#[derive(Resource, Debug, Clone)]
pub struct DifficultySettings {
    difficulties: Vec<DifficultyConfig>,
    current: usize,
}

impl Default for DifficultySettings {
    fn default() -> Self {
        Self {
            difficulties: vec![DifficultyConfig::default()],
            current: 0,
        }
    }
}

impl DifficultySettings {
    pub fn new(difficulties: Vec<DifficultyConfig>, default_difficulty: usize) -> Result<Self, ConfigError> {
        if difficulties.is_empty() {
            return Err(ConfigError::EmptyDifficultyTable);
        }
        for difficulty in &difficulties {
            difficulty.validate()?;
        }

        let mut settings = Self {
            difficulties,
            current: 0,
        };
        settings.set_difficulty(default_difficulty);
        Ok(settings)
    }

    pub fn from_table(table: DifficultyTable) -> Result<Self, ConfigError> {
        Self::new(table.difficulties, table.default_difficulty)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let table: DifficultyTable = toml::from_str(source)?;
        Self::from_table(table)
    }

    /// Выбрать сложность; индекс зажимается в пределы таблицы
    pub fn set_difficulty(&mut self, level: usize) {
        self.current = level.min(self.difficulties.len() - 1);
        crate::logger::log_info(&format!(
            "Difficulty set to '{}' (level {})",
            self.difficulties[self.current].name, self.current
        ));
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &DifficultyConfig {
        &self.difficulties[self.current]
    }

    pub fn difficulties(&self) -> &[DifficultyConfig] {
        &self.difficulties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const TABLE: &str = r#"
default_difficulty = 1

[[difficulties]]
name = "Easy"
inversion_max_duration = 10.0

[[difficulties]]
name = "Hard"
max_player_health = 60.0
weapon_blackout_multiplier = 1.5

[[difficulties.weapons]]
weapon = "pistol"
start_in_clip = { min = 3, max = 6 }
start_total = { min = 10, max = 10 }
"#;

    #[test]
    fn test_from_toml_uses_defaults_for_missing_fields() {
        let settings = DifficultySettings::from_toml_str(TABLE).unwrap();

        assert_eq!(settings.current_level(), 1);
        let hard = settings.current();
        assert_eq!(hard.name, "Hard");
        assert_eq!(hard.max_player_health, 60.0);
        assert_eq!(hard.player_heal_cooldown, 60.0);
        assert_eq!(hard.inversion_health_loss_interval, 1.0);
        assert!(hard.weapon_config("pistol").is_some());
        assert!(hard.weapon_config("rifle").is_none());
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let result = DifficultySettings::new(Vec::new(), 0);
        assert!(matches!(result, Err(ConfigError::EmptyDifficultyTable)));
    }

    #[test]
    fn test_invalid_interval_is_rejected() {
        let config = DifficultyConfig {
            inversion_health_loss_interval: 0.0,
            ..Default::default()
        };
        let result = DifficultySettings::new(vec![config], 0);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "inversion_health_loss_interval", .. })
        ));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let config = DifficultyConfig {
            weapons: vec![WeaponConfig {
                weapon: "pistol".into(),
                start_in_clip: IntRange::new(5, 2),
                start_total: IntRange::fixed(10),
            }],
            ..Default::default()
        };
        assert!(matches!(
            DifficultySettings::new(vec![config], 0),
            Err(ConfigError::InvalidRange { min: 5, max: 2, .. })
        ));
    }

    #[test]
    fn test_set_difficulty_clamps_to_table() {
        let mut settings = DifficultySettings::from_toml_str(TABLE).unwrap();
        settings.set_difficulty(99);
        assert_eq!(settings.current_level(), 1);
        settings.set_difficulty(0);
        assert_eq!(settings.current().name, "Easy");
    }

    #[test]
    fn test_int_range_sample_stays_inside() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = IntRange::new(3, 6);
        for _ in 0..100 {
            let value = range.sample(&mut rng);
            assert!((3..=6).contains(&value));
        }
        assert_eq!(IntRange::fixed(4).sample(&mut rng), 4);
    }

    #[test]
    fn test_bad_toml_reports_parse_error() {
        let result = DifficultySettings::from_toml_str("difficulties = 5");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
