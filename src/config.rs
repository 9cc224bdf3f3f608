use crate::game::constants::{leaderboard, view, world};
use crate::util::rect::Rect;

/// View tuning shared with every session update
#[derive(Debug, Clone, Copy)]
pub struct ViewTuning {
    /// Base sight range granted regardless of cell count
    pub sight_base: f32,
    /// Extra sight range per unit of owned-cell display size
    pub sight_scale: f32,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Sight range tuning
    pub view: ViewTuning,
    /// Ticks between view-box recomputations for each session
    pub view_refresh_period: u32,
    /// Ticks between leaderboard pushes to each session
    pub leaderboard_period: u32,
    /// Maximum ranked leaderboard entries
    pub leaderboard_size: usize,
    /// World bounds sent to clients on join
    pub border: Rect,
    /// Food cells the binary seeds the world with
    pub food_target: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            view: ViewTuning {
                sight_base: view::SIGHT_BASE,
                sight_scale: view::SIGHT_SCALE,
            },
            view_refresh_period: view::REFRESH_PERIOD,
            leaderboard_period: leaderboard::PUSH_PERIOD,
            leaderboard_size: leaderboard::MAX_ENTRIES,
            border: Rect::new(
                world::BORDER_LEFT,
                world::BORDER_RIGHT,
                world::BORDER_TOP,
                world::BORDER_BOTTOM,
            ),
            food_target: world::FOOD_TARGET,
        }
    }
}

/// Configuration faults detected at construction time
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sight base must be a positive, finite value (got {0})")]
    InvalidSightBase(f32),
    #[error("sight scale must be a non-negative, finite value (got {0})")]
    InvalidSightScale(f32),
    #[error("leaderboard size must be at least 1")]
    EmptyLeaderboard,
    #[error("world border is malformed: {0:?}")]
    MalformedBorder(Rect),
}

impl ServerConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("SIGHT_BASE") {
            if let Ok(parsed) = base.parse::<f32>() {
                config.view.sight_base = parsed;
            } else {
                tracing::warn!("Invalid SIGHT_BASE '{}', using default", base);
            }
        }

        if let Ok(scale) = std::env::var("SIGHT_SCALE") {
            if let Ok(parsed) = scale.parse::<f32>() {
                config.view.sight_scale = parsed;
            } else {
                tracing::warn!("Invalid SIGHT_SCALE '{}', using default", scale);
            }
        }

        if let Ok(period) = std::env::var("VIEW_REFRESH_PERIOD") {
            if let Ok(parsed) = period.parse::<u32>() {
                config.view_refresh_period = parsed;
            } else {
                tracing::warn!("Invalid VIEW_REFRESH_PERIOD '{}', using default", period);
            }
        }

        if let Ok(period) = std::env::var("LEADERBOARD_PERIOD") {
            if let Ok(parsed) = period.parse::<u32>() {
                config.leaderboard_period = parsed;
            } else {
                tracing::warn!("Invalid LEADERBOARD_PERIOD '{}', using default", period);
            }
        }

        if let Ok(size) = std::env::var("LEADERBOARD_SIZE") {
            if let Ok(parsed) = size.parse::<usize>() {
                if parsed > 0 {
                    config.leaderboard_size = parsed;
                } else {
                    tracing::warn!("LEADERBOARD_SIZE must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid LEADERBOARD_SIZE '{}', using default", size);
            }
        }

        if let Ok(target) = std::env::var("FOOD_TARGET") {
            if let Ok(parsed) = target.parse::<usize>() {
                config.food_target = parsed;
            } else {
                tracing::warn!("Invalid FOOD_TARGET '{}', using default", target);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.view.sight_base.is_finite() || self.view.sight_base <= 0.0 {
            return Err(ConfigError::InvalidSightBase(self.view.sight_base));
        }
        if !self.view.sight_scale.is_finite() || self.view.sight_scale < 0.0 {
            return Err(ConfigError::InvalidSightScale(self.view.sight_scale));
        }
        if self.leaderboard_size == 0 {
            return Err(ConfigError::EmptyLeaderboard);
        }
        if !self.border.is_well_formed() {
            return Err(ConfigError::MalformedBorder(self.border));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.view_refresh_period, 4);
        assert_eq!(config.leaderboard_period, 40);
        assert_eq!(config.leaderboard_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = ServerConfig::load_or_default();
        assert!(config.view.sight_base > 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_sight_base() {
        let mut config = ServerConfig::default();
        config.view.sight_base = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSightBase(_))
        ));
        config.view.sight_base = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_scale() {
        let mut config = ServerConfig::default();
        config.view.sight_scale = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSightScale(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_leaderboard() {
        let mut config = ServerConfig::default();
        config.leaderboard_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLeaderboard)));
    }

    #[test]
    fn test_validate_rejects_inverted_border() {
        let mut config = ServerConfig::default();
        config.border = Rect::new(100.0, 0.0, 0.0, 100.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedBorder(_))
        ));
    }
}
