use expo_core::error::CoreError;
use expo_core::types::EventYear;

/// Default size of the database connection pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Daemon configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Event year whose markers are loaded and edited.
    pub event_year: EventYear,
    /// Connection pool size (default: `10`).
    pub max_connections: u32,
    /// Undo stack cap; `None` keeps every entry.
    pub history_limit: Option<usize>,
}

impl SyncConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var              | Default     |
    /// |----------------------|-------------|
    /// | `DATABASE_URL`       | required    |
    /// | `EVENT_YEAR`         | required    |
    /// | `DB_MAX_CONNECTIONS` | `10`        |
    /// | `HISTORY_LIMIT`      | unbounded   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let database_url = required(&lookup, "DATABASE_URL")?;
        let event_year = parse(&lookup, "EVENT_YEAR")?
            .ok_or_else(|| CoreError::Validation("EVENT_YEAR must be set".into()))?;
        let max_connections =
            parse(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            return Err(CoreError::Validation(
                "DB_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }
        let history_limit = parse(&lookup, "HISTORY_LIMIT")?;

        Ok(Self {
            database_url,
            event_year,
            max_connections,
            history_limit,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, CoreError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("{key} must be set")))
}

/// Parse an optional variable. Unset or blank is `None`; garbage is an error.
fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, CoreError> {
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Validation(format!("{key} has invalid value '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<SyncConfig, CoreError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/expo"), ("EVENT_YEAR", "2025")])
            .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/expo");
        assert_eq!(config.event_year, 2025);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn optional_vars_override_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/expo"),
            ("EVENT_YEAR", "2026"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("HISTORY_LIMIT", " 50 "),
        ])
        .unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.history_limit, Some(50));
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = load(&[("EVENT_YEAR", "2025")]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn missing_event_year_is_rejected() {
        let err = load(&[("DATABASE_URL", "postgres://db/expo")]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("EVENT_YEAR")));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db/expo"),
            ("EVENT_YEAR", "next year"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg.contains("next year")));

        let err = load(&[
            ("DATABASE_URL", "postgres://db/expo"),
            ("EVENT_YEAR", "2025"),
            ("HISTORY_LIMIT", "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db/expo"),
            ("EVENT_YEAR", "2025"),
            ("DB_MAX_CONNECTIONS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
