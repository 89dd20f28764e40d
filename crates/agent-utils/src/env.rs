//! Environment configuration helpers

use thiserror::Error;

/// Errors raised while reading process configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Variable is absent
    #[error("{name} is not set; export it or add it to a .env file")]
    Missing {
        /// Variable name
        name: String,
    },

    /// Variable is present but only whitespace
    #[error("{name} is set but empty")]
    Blank {
        /// Variable name
        name: String,
    },
}

/// Load a `.env` file from the working directory or its parents, if one exists
///
/// Variables already present in the process environment win.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(_) => tracing::debug!("No .env file found"),
    }
}

/// Read a required variable through a custom lookup
///
/// `lookup` returns `None` when the variable is absent. The value is
/// returned trimmed.
pub fn require_with<F>(name: &str, lookup: F) -> Result<String, EnvError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| EnvError::Missing {
        name: name.to_string(),
    })?;

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError::Blank {
            name: name.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

/// Read an optional variable through a custom lookup, treating blank as unset
pub fn optional_with<F>(name: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn test_require_present() {
        let vars = HashMap::from([("OPENAI_API_KEY", "  sk-test  ")]);
        let value = require_with("OPENAI_API_KEY", lookup_in(&vars)).unwrap();
        assert_eq!(value, "sk-test");
    }

    #[test]
    fn test_require_missing() {
        let vars = HashMap::new();
        let err = require_with("OPENAI_API_KEY", lookup_in(&vars)).unwrap_err();
        assert_eq!(
            err,
            EnvError::Missing {
                name: "OPENAI_API_KEY".to_string()
            }
        );
        assert!(err.to_string().contains("OPENAI_API_KEY is not set"));
    }

    #[test]
    fn test_require_blank() {
        let vars = HashMap::from([("OPENAI_API_KEY", "   ")]);
        let err = require_with("OPENAI_API_KEY", lookup_in(&vars)).unwrap_err();
        assert!(matches!(err, EnvError::Blank { .. }));
    }

    #[test]
    fn test_optional_blank_is_none() {
        let vars = HashMap::from([("OPENAI_MODEL", ""), ("OPENAI_API_BASE", "http://x")]);
        assert_eq!(optional_with("OPENAI_MODEL", lookup_in(&vars)), None);
        assert_eq!(
            optional_with("OPENAI_API_BASE", lookup_in(&vars)),
            Some("http://x".to_string())
        );
        assert_eq!(optional_with("MISSING", lookup_in(&vars)), None);
    }
}
