//! Environment lookups for the `SECTIONER_*` overrides.
//!
//! [`Env::real()`] reads the process environment; [`Env::mock()`] serves a
//! fixed table so config tests never touch [`std::env::set_var`].
//! An empty or whitespace-only value counts as unset.

use std::collections::HashMap;

/// Source of environment overrides.
#[derive(Clone, Debug)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Read from the process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Serve exactly the given pairs.
    #[cfg(test)]
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    /// Raw lookup, empty values included.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// The trimmed value, or `None` when absent or blank.
    pub fn value(&self, name: &str) -> Option<String> {
        let val = self.var(name).ok()?;
        let trimmed = val.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Whether the variable holds a non-blank value.
    pub fn is_set(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    /// Read a boolean switch such as `SECTIONER_CACHE=off`.
    ///
    /// Returns `None` when the variable is unset or not a recognised
    /// spelling, so callers keep their current value.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.value(name)?.to_lowercase().as_str() {
            "false" | "0" | "no" | "off" => Some(false),
            "true" | "1" | "yes" | "on" => Some(true),
            _ => None,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        let env = Env::real();
        assert!(env.is_set("CARGO_MANIFEST_DIR"));
    }

    #[test]
    fn flag_parses_common_spellings() {
        let env = Env::mock([("ON", "yes"), ("OFF", " 0 "), ("JUNK", "maybe")]);
        assert_eq!(env.flag("ON"), Some(true));
        assert_eq!(env.flag("OFF"), Some(false));
        assert_eq!(env.flag("JUNK"), None);
        assert_eq!(env.flag("MISSING"), None);
    }

    #[test]
    fn value_trims_and_skips_blank() {
        let env = Env::mock([("TOKEN", "  ghp_abc\n"), ("EMPTY", ""), ("SPACES", "   ")]);
        assert_eq!(env.value("TOKEN").as_deref(), Some("ghp_abc"));
        assert_eq!(env.value("EMPTY"), None);
        assert_eq!(env.value("SPACES"), None);
        assert_eq!(env.value("ABSENT"), None);
        // raw lookup still sees the empty value
        assert_eq!(env.var("EMPTY").unwrap(), "");
    }

    #[test]
    fn is_set_ignores_empty_values() {
        let env = Env::mock([("SECTIONER_METHOD", "hybrid"), ("SECTIONER_BACKEND", "")]);
        assert!(env.is_set("SECTIONER_METHOD"));
        assert!(!env.is_set("SECTIONER_BACKEND"));
        assert!(!env.is_set("SECTIONER_TOKEN"));
    }
}
