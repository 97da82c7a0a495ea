//! Runtime configuration from environment variables.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value for {key}: '{value}'")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// Application settings.
///
/// | variable | meaning | default |
/// |---|---|---|
/// | `STOCKROOM_DATA_DIR` | directory for the collection files | in-memory store |
/// | `STOCKROOM_SEED` | seed demo data into absent collections | `true` |
/// | `STOCKROOM_ADMIN_PASSWORD` | credential for the seeded admin | none |
/// | `STOCKROOM_AUTH_URL` | remote login endpoint (`remote` feature) | none |
/// | `STOCKROOM_ARGON2_MEMORY_KIB` | Argon2 memory cost for new hashes | crate default |
/// | `STOCKROOM_ARGON2_ITERATIONS` | Argon2 passes for new hashes | crate default |
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub seed: bool,
    pub admin_password: Option<String>,
    pub auth_url: Option<String>,
    pub argon2_memory_kib: Option<u32>,
    pub argon2_iterations: Option<u32>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("seed", &self.seed)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("auth_url", &self.auth_url)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let seed = match get("STOCKROOM_SEED") {
            None => true,
            Some(v) => parse_bool("STOCKROOM_SEED", &v)?,
        };

        Ok(Self {
            data_dir: get("STOCKROOM_DATA_DIR").map(PathBuf::from),
            seed,
            admin_password: get("STOCKROOM_ADMIN_PASSWORD"),
            auth_url: get("STOCKROOM_AUTH_URL"),
            argon2_memory_kib: get("STOCKROOM_ARGON2_MEMORY_KIB")
                .map(|v| parse_u32("STOCKROOM_ARGON2_MEMORY_KIB", &v))
                .transpose()?,
            argon2_iterations: get("STOCKROOM_ARGON2_ITERATIONS")
                .map(|v| parse_u32("STOCKROOM_ARGON2_ITERATIONS", &v))
                .transpose()?,
        })
    }

    /// In-memory, seeded, no credentials.
    pub fn in_memory() -> Self {
        Self {
            seed: true,
            ..Self::default()
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, AppConfig::in_memory());
    }

    #[test]
    fn reads_every_setting() {
        let cfg = config(&[
            ("STOCKROOM_DATA_DIR", "/var/lib/stockroom"),
            ("STOCKROOM_SEED", "no"),
            ("STOCKROOM_ADMIN_PASSWORD", "change-me-now"),
            ("STOCKROOM_AUTH_URL", "https://auth.example.test/login"),
            ("STOCKROOM_ARGON2_MEMORY_KIB", "4096"),
            ("STOCKROOM_ARGON2_ITERATIONS", "2"),
        ])
        .unwrap();
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/stockroom")));
        assert!(!cfg.seed);
        assert_eq!(cfg.admin_password.as_deref(), Some("change-me-now"));
        assert_eq!(cfg.argon2_memory_kib, Some(4096));
        assert_eq!(cfg.argon2_iterations, Some(2));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("STOCKROOM_DATA_DIR", "  "), ("STOCKROOM_SEED", "")]).unwrap();
        assert_eq!(cfg.data_dir, None);
        assert!(cfg.seed);
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = config(&[("STOCKROOM_ARGON2_MEMORY_KIB", "lots")]).unwrap_err();
        assert_eq!(err.key, "STOCKROOM_ARGON2_MEMORY_KIB");
        assert!(config(&[("STOCKROOM_SEED", "maybe")]).is_err());
    }

    #[test]
    fn debug_output_hides_the_password() {
        let cfg = config(&[("STOCKROOM_ADMIN_PASSWORD", "change-me-now")]).unwrap();
        assert!(!format!("{cfg:?}").contains("change-me-now"));
    }
}
