use std::env;
use std::path::PathBuf;

pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_VISION_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub openai_api_key: String,
    pub vision_model: String,
    pub vision_base_url: String,
    pub vision_temperature: f32,
    pub vision_max_tokens: u32,
    pub vision_json_mode: bool,
    pub vision_timeout_seconds: u64,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    /// Problems found while loading, logged once logging is up.
    pub notices: Vec<String>,
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn normalize_temperature(value: f32, notices: &mut Vec<String>) -> f32 {
    if !(0.0..=2.0).contains(&value) {
        notices.push(format!(
            "VISION_TEMPERATURE {} is outside 0.0..=2.0; using 0.7 instead.",
            value
        ));
        return 0.7;
    }
    value
}

impl Config {
    /// Reads settings from the process environment. A missing API key is not
    /// an error here: only extraction depends on it, so the vision client
    /// reports it when it is initialised.
    pub fn load() -> Self {
        let data_dir = PathBuf::from(env_string("CATALOG_DATA_DIR", "data"));
        let database_path = env::var("CATALOG_DATABASE_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("catalog.db"));
        let mut notices = Vec::new();
        let vision_temperature =
            normalize_temperature(env_f32("VISION_TEMPERATURE", 0.7), &mut notices);

        Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            openai_api_key: env_string("OPENAI_API_KEY", "").trim().to_string(),
            vision_model: env_string("VISION_MODEL", DEFAULT_VISION_MODEL),
            vision_base_url: env_string("VISION_BASE_URL", DEFAULT_VISION_BASE_URL),
            vision_temperature,
            vision_max_tokens: env_u32("VISION_MAX_TOKENS", 2000).max(1),
            vision_json_mode: env_bool("VISION_JSON_MODE", true),
            vision_timeout_seconds: env_u64("VISION_TIMEOUT_SECONDS", 0),
            data_dir,
            database_path,
            notices,
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.data_dir.join("thumbnails")
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(data_dir: &std::path::Path) -> Self {
        Config {
            log_level: "info".to_string(),
            log_dir: data_dir.join("logs"),
            openai_api_key: "sk-test".to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vision_base_url: DEFAULT_VISION_BASE_URL.to_string(),
            vision_temperature: 0.7,
            vision_max_tokens: 2000,
            vision_json_mode: true,
            vision_timeout_seconds: 0,
            data_dir: data_dir.to_path_buf(),
            database_path: data_dir.join("catalog.db"),
            notices: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_temperature_falls_back_with_a_notice() {
        let mut notices = Vec::new();
        assert_eq!(normalize_temperature(1.2, &mut notices), 1.2);
        assert!(notices.is_empty());

        assert_eq!(normalize_temperature(3.5, &mut notices), 0.7);
        assert_eq!(normalize_temperature(-0.1, &mut notices), 0.7);
        assert_eq!(notices.len(), 2);
        assert!(notices[0].starts_with("VISION_TEMPERATURE 3.5 is outside"));
    }

    #[test]
    fn directories_live_under_data_dir() {
        let config = Config::for_tests(std::path::Path::new("/srv/catalog"));
        assert_eq!(config.uploads_dir(), PathBuf::from("/srv/catalog/uploads"));
        assert_eq!(
            config.thumbnails_dir(),
            PathBuf::from("/srv/catalog/thumbnails")
        );
    }
}
