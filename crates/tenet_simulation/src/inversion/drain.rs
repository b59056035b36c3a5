//! InversionDrain — периодическая потеря здоровья в Inverted.

use crate::config::DifficultyConfig;

/// Минимальный интервал между pulse (защита от бесконечного цикла в tick)
const MIN_INTERVAL: f32 = 1.0e-3;

/// Countdown-задача: ждём `max_duration`, затем pulse сразу и каждые `interval`
///
/// Отмена = замена/удаление экземпляра (`InversionRules::apply_inversion_effects`).
#[derive(Debug, Clone, PartialEq)]
pub struct InversionDrain {
    remaining: f32,
    interval: f32,
    percent: f32,
    pulses: u32,
}

impl InversionDrain {
    pub fn new(max_duration: f32, interval: f32, percent: f32) -> Self {
        Self {
            remaining: max_duration.max(0.0),
            interval: interval.max(MIN_INTERVAL),
            percent,
            pulses: 0,
        }
    }

    pub fn from_config(config: &DifficultyConfig) -> Self {
        Self::new(
            config.inversion_max_duration,
            config.inversion_health_loss_interval,
            config.inversion_health_loss_percent,
        )
    }

    /// Доля max health за один pulse
    pub fn percent(&self) -> f32 {
        self.percent
    }

    /// Сколько pulse уже случилось
    pub fn pulses(&self) -> u32 {
        self.pulses
    }

    /// Продвинуть время, вернуть сколько pulse пришлось на этот delta
    pub fn tick(&mut self, delta: f32) -> u32 {
        self.remaining -= delta;

        let mut fired = 0;
        while self.remaining <= 0.0 {
            fired += 1;
            self.remaining += self.interval;
        }
        self.pulses += fired;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pulse_before_max_duration() {
        let mut drain = InversionDrain::new(5.0, 1.0, 0.02);
        assert_eq!(drain.tick(4.9), 0);
        assert_eq!(drain.pulses(), 0);
    }

    #[test]
    fn test_first_pulse_then_every_interval() {
        let mut drain = InversionDrain::new(5.0, 1.0, 0.02);
        assert_eq!(drain.tick(5.0), 1);
        assert_eq!(drain.tick(0.5), 0);
        assert_eq!(drain.tick(0.5), 1);
        assert_eq!(drain.tick(2.0), 2);
        assert_eq!(drain.pulses(), 4);
    }

    #[test]
    fn test_fixed_step_schedule() {
        // 60 Hz: к 7.5 секунде pulse на 5, 6, 7
        let mut drain = InversionDrain::new(5.0, 1.0, 0.02);
        let mut total = 0;
        for _ in 0..450 {
            total += drain.tick(1.0 / 60.0);
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn test_from_config() {
        let config = DifficultyConfig::default();
        let drain = InversionDrain::from_config(&config);
        assert_eq!(drain.percent(), config.inversion_health_loss_percent);
    }
}
