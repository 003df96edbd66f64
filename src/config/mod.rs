use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::{MapError, MapResult};

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub venue: VenueConfig,
    pub redis: RedisConfig,
    pub map: MapConfig,
    pub live_feed: LiveFeedConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_json: bool,
}

// Откуда грузить схему зала: путь к файлу или http(s) URL
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub source: String,
}

// Настройки Redis (без URL выбор хранится в памяти процесса)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

// Геометрия карты и лимиты выбора
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_geometry"))]
pub struct MapConfig {
    #[validate(range(min = 1, max = 64))]
    pub max_selection: usize,
    #[validate(range(min = 1.0))]
    pub cell_size: f64,
    #[validate(range(min = 1.0))]
    pub hit_radius: f64,
    #[validate(range(min = 1, max = 1000))]
    pub frame_interval_ms: u64,
    pub flash_ms: u64,
    pub tooltip_offset: f64,
}

// Симулятор живых обновлений
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LiveFeedConfig {
    pub enabled: bool,
    #[validate(range(min = 1))]
    pub interval_ms: u64,
    pub seed: Option<u64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_selection: crate::models::DEFAULT_MAX_SELECTION,
            cell_size: 48.0,
            hit_radius: 20.0,
            frame_interval_ms: 16,
            flash_ms: 1400,
            tooltip_offset: 12.0,
        }
    }
}

impl Default for LiveFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 800,
            seed: None,
        }
    }
}

impl MapConfig {
    pub fn hit_radius_sq(&self) -> f64 {
        self.hit_radius * self.hit_radius
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

impl LiveFeedConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// Ячейка сетки должна быть не меньше диаметра попадания, иначе соседние 3x3 ячейки
// не покрывают радиус
fn validate_geometry(map: &MapConfig) -> Result<(), ValidationError> {
    if map.cell_size < 2.0 * map.hit_radius {
        return Err(ValidationError::new("cell_size_below_hit_diameter"));
    }
    Ok(())
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> MapResult<T> {
    let raw = var_or(key, default);
    raw.parse()
        .map_err(|_| MapError::config(format!("{key} must be a valid value, got '{raw}'")))
}

fn parse_optional<T: FromStr>(key: &str) -> MapResult<Option<T>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| MapError::config(format!("{key} must be a valid value, got '{raw}'"))),
        _ => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> MapResult<Self> {
        let config = Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var("PORT", "8000")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "seat_map=debug,tower_http=debug"),
                log_json: parse_var("LOG_JSON", "false")?,
            },
            venue: VenueConfig {
                source: var_or("VENUE_SOURCE", "data/venue_demo.json"),
            },
            redis: RedisConfig {
                url: parse_optional("REDIS_URL")?,
            },
            map: MapConfig {
                max_selection: parse_var("MAX_SELECTION", "8")?,
                cell_size: parse_var("CELL_SIZE", "48")?,
                hit_radius: parse_var("HIT_RADIUS", "20")?,
                frame_interval_ms: parse_var("FRAME_INTERVAL_MS", "16")?,
                flash_ms: parse_var("FLASH_MS", "1400")?,
                tooltip_offset: parse_var("TOOLTIP_OFFSET", "12")?,
            },
            live_feed: LiveFeedConfig {
                enabled: parse_var("LIVE_FEED_ENABLED", "true")?,
                interval_ms: parse_var("LIVE_FEED_INTERVAL_MS", "800")?,
                seed: parse_optional("LIVE_FEED_SEED")?,
            },
        };
        config.map.validate()?;
        config.live_feed.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_geometry() {
        assert!(MapConfig::default().validate().is_ok());
        assert_eq!(MapConfig::default().hit_radius_sq(), 400.0);
    }

    #[test]
    fn cell_smaller_than_hit_diameter_is_rejected() {
        let map = MapConfig {
            cell_size: 30.0,
            ..MapConfig::default()
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn zero_selection_limit_is_rejected() {
        let map = MapConfig {
            max_selection: 0,
            ..MapConfig::default()
        };
        assert!(map.validate().is_err());
    }
}
