//! Environment-driven settings, read once per cold start.

use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_TABLE: &str = "url-shortener-skr";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://skrt.in/";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 7;

#[derive(Debug, Clone)]
pub struct LinksConfig {
    pub table_name: String,
    /// Base for short URLs created through direct invocation.
    pub public_base_url: String,
    pub max_attempts: u32,
}

impl LinksConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            table_name: env_or("TABLE_NAME", DEFAULT_TABLE),
            public_base_url: env_or("PUBLIC_BASE_URL", DEFAULT_PUBLIC_BASE_URL),
            max_attempts: env_parse("MAX_CODE_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?.max(1),
        })
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Where the HMAC signing secret comes from.
#[derive(Clone, PartialEq)]
pub enum SecretConfig {
    Static(String),
    /// Base64 KMS ciphertext, decrypted on first use.
    KmsEncrypted(String),
}

impl std::fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretConfig::Static(_) => f.write_str("Static(<redacted>)"),
            SecretConfig::KmsEncrypted(_) => f.write_str("KmsEncrypted(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
    pub secret: SecretConfig,
    pub leeway_secs: u64,
}

impl AuthorizerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = match non_empty("JWT_SECRET_CIPHERTEXT") {
            Some(ct) => SecretConfig::KmsEncrypted(ct),
            None => {
                let s = std::env::var("JWT_SECRET").unwrap_or_default();
                if s.is_empty() {
                    tracing::warn!("no JWT_SECRET or JWT_SECRET_CIPHERTEXT set; every request will be denied");
                }
                SecretConfig::Static(s)
            }
        };
        Ok(Self {
            secret,
            leeway_secs: env_parse("JWT_LEEWAY_SECS", 0)?,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    non_empty(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    // tiny RAII guard to restore env at the end of each test
    struct EnvGuard {
        k: String,
        v: Option<String>,
    }
    impl EnvGuard {
        fn set(k: &str, v: &str) -> Self {
            let old = env::var(k).ok();
            env::set_var(k, v);
            Self {
                k: k.to_string(),
                v: old,
            }
        }
        fn unset(k: &str) -> Self {
            let old = env::var(k).ok();
            env::remove_var(k);
            Self {
                k: k.to_string(),
                v: old,
            }
        }
    }
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.v {
                Some(val) => env::set_var(&self.k, val),
                None => env::remove_var(&self.k),
            }
        }
    }

    #[test]
    #[serial(env)]
    fn links_defaults() {
        let _a = EnvGuard::unset("TABLE_NAME");
        let _b = EnvGuard::unset("PUBLIC_BASE_URL");
        let _c = EnvGuard::unset("MAX_CODE_ATTEMPTS");
        let cfg = LinksConfig::from_env().unwrap();
        assert_eq!(cfg.table_name, "url-shortener-skr");
        assert_eq!(cfg.public_base_url, "https://skrt.in/");
        assert_eq!(cfg.max_attempts, 7);
    }

    #[test]
    #[serial(env)]
    fn links_overrides() {
        let _a = EnvGuard::set("TABLE_NAME", "links-prod");
        let _b = EnvGuard::set("PUBLIC_BASE_URL", "https://go.example/");
        let _c = EnvGuard::set("MAX_CODE_ATTEMPTS", "3");
        let cfg = LinksConfig::from_env().unwrap();
        assert_eq!(cfg.table_name, "links-prod");
        assert_eq!(cfg.public_base_url, "https://go.example/");
        assert_eq!(cfg.max_attempts, 3);
    }

    #[test]
    #[serial(env)]
    fn zero_attempts_is_clamped() {
        let _c = EnvGuard::set("MAX_CODE_ATTEMPTS", "0");
        assert_eq!(LinksConfig::from_env().unwrap().max_attempts, 1);
    }

    #[test]
    #[serial(env)]
    fn bad_number_is_rejected() {
        let _c = EnvGuard::set("MAX_CODE_ATTEMPTS", "lots");
        let err = LinksConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("MAX_CODE_ATTEMPTS"));
    }

    #[test]
    #[serial(env)]
    fn ciphertext_takes_precedence() {
        let _a = EnvGuard::set("JWT_SECRET", "plain");
        let _b = EnvGuard::set("JWT_SECRET_CIPHERTEXT", "AQICAHh...");
        let _c = EnvGuard::unset("JWT_LEEWAY_SECS");
        let cfg = AuthorizerConfig::from_env().unwrap();
        assert_eq!(cfg.secret, SecretConfig::KmsEncrypted("AQICAHh...".into()));
        assert_eq!(cfg.leeway_secs, 0);
    }

    #[test]
    #[serial(env)]
    fn static_secret_and_leeway() {
        let _a = EnvGuard::set("JWT_SECRET", "plain");
        let _b = EnvGuard::unset("JWT_SECRET_CIPHERTEXT");
        let _c = EnvGuard::set("JWT_LEEWAY_SECS", "30");
        let cfg = AuthorizerConfig::from_env().unwrap();
        assert_eq!(cfg.secret, SecretConfig::Static("plain".into()));
        assert_eq!(cfg.leeway_secs, 30);
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let s = format!("{:?}", SecretConfig::Static("hunter2".into()));
        assert!(!s.contains("hunter2"));
    }
}
