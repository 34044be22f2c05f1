use std::{env, path::PathBuf};

use tracing::{info, warn};

use crate::settings::DEFAULT_INSTITUTION_NAME;
use crate::store::Backend;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub db_path: PathBuf,
    pub seed: bool,
    pub institution_name: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            backend: load_backend("DEPTD_STORE", Backend::Memory),
            db_path: PathBuf::from(load_string("DEPTD_DB_PATH", "deptd.sqlite3")),
            seed: load_flag("DEPTD_SEED", true),
            institution_name: load_string("DEPTD_INSTITUTION_NAME", DEFAULT_INSTITUTION_NAME),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_string(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn load_backend(key: &str, default: Backend) -> Backend {
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {}", default.as_str());
        return default;
    };
    Backend::parse(&raw).unwrap_or_else(|| {
        warn!("Invalid {key} value: {raw}, using {}", default.as_str());
        default
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn load_flag(key: &str, default: bool) -> bool {
    let Some(raw) = var(key) else {
        return default;
    };
    parse_flag(&raw).unwrap_or_else(|| {
        warn!("Invalid {key} value: {raw}, using {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
