use crate::dispatcher::DispatchPolicy;
use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Prefix for every environment variable the crate reads
pub const ENV_PREFIX: &str = "SAFE_CALLBACK";

/// Defaults applied by [`crate::guard::GuardBuilder::from_config`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub guard_name: String,
    pub dispatch_policy: DispatchPolicy,
    pub validate_on_build: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            guard_name: "guard".to_string(),
            dispatch_policy: DispatchPolicy::Exact,
            validate_on_build: false,
        }
    }
}

impl GuardConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(&format!("{ENV_PREFIX}_GUARD_NAME")) {
            config.guard_name = name;
        }

        if let Some(policy) = lookup(&format!("{ENV_PREFIX}_DISPATCH_POLICY")) {
            config.dispatch_policy = policy.parse()?;
        }

        if let Some(validate) = lookup(&format!("{ENV_PREFIX}_VALIDATE_ON_BUILD")) {
            config.validate_on_build = parse_flag(&validate).ok_or_else(|| {
                GuardError::Configuration(format!("Invalid validate_on_build: {validate}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Layer an optional file (TOML, YAML, JSON...) and `SAFE_CALLBACK_*` variables over
    /// the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Like [`GuardConfig::load`], reading variables from `environment` instead of the
    /// process environment when given
    pub fn load_from(
        path: Option<&Path>,
        environment: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading guard configuration file");
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .source(environment.map(|vars| vars.into_iter().collect())),
        );

        let config: Self = builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| GuardError::Configuration(e.to_string()))?;

        config.validate()?;
        debug!(
            guard_name = %config.guard_name,
            dispatch_policy = %config.dispatch_policy,
            validate_on_build = config.validate_on_build,
            "Guard configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.guard_name.trim().is_empty() {
            return Err(GuardError::Configuration(
                "guard_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Boolean spellings shared with the `config` crate's string conversion
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.guard_name, "guard");
        assert_eq!(config.dispatch_policy, DispatchPolicy::Exact);
        assert!(!config.validate_on_build);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = GuardConfig::from_lookup(lookup_from(&[
            ("SAFE_CALLBACK_GUARD_NAME", "payments"),
            ("SAFE_CALLBACK_DISPATCH_POLICY", "ancestry"),
            ("SAFE_CALLBACK_VALIDATE_ON_BUILD", "true"),
        ]))
        .unwrap();

        assert_eq!(config.guard_name, "payments");
        assert_eq!(config.dispatch_policy, DispatchPolicy::Ancestry);
        assert!(config.validate_on_build);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_policy =
            GuardConfig::from_lookup(lookup_from(&[("SAFE_CALLBACK_DISPATCH_POLICY", "fuzzy")]));
        assert!(matches!(bad_policy, Err(GuardError::Configuration(_))));

        let bad_flag =
            GuardConfig::from_lookup(lookup_from(&[("SAFE_CALLBACK_VALIDATE_ON_BUILD", "maybe")]));
        assert!(matches!(bad_flag, Err(GuardError::Configuration(_))));

        let empty_name = GuardConfig::from_lookup(lookup_from(&[("SAFE_CALLBACK_GUARD_NAME", " ")]));
        assert!(empty_name.is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "guard_name = \"reports\"").unwrap();
        writeln!(file, "dispatch_policy = \"ancestry\"").unwrap();

        let config = GuardConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.guard_name, "reports");
        assert_eq!(config.dispatch_policy, DispatchPolicy::Ancestry);
        assert!(!config.validate_on_build);
    }

    #[test]
    fn test_load_and_lookup_accept_the_same_values() {
        let vars = [
            ("SAFE_CALLBACK_GUARD_NAME", "billing"),
            ("SAFE_CALLBACK_DISPATCH_POLICY", " Hierarchy "),
            ("SAFE_CALLBACK_VALIDATE_ON_BUILD", "yes"),
        ];
        let environment: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let loaded = GuardConfig::load_from(None, Some(environment)).unwrap();
        let looked_up = GuardConfig::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(loaded, looked_up);
        assert_eq!(loaded.guard_name, "billing");
        assert_eq!(loaded.dispatch_policy, DispatchPolicy::Ancestry);
        assert!(loaded.validate_on_build);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "guard_name = \"reports\"").unwrap();
        writeln!(file, "dispatch_policy = \"Ancestry\"").unwrap();

        let environment = HashMap::from([(
            "SAFE_CALLBACK_GUARD_NAME".to_string(),
            "nightly-reports".to_string(),
        )]);
        let config = GuardConfig::load_from(Some(file.path()), Some(environment)).unwrap();
        assert_eq!(config.guard_name, "nightly-reports");
        assert_eq!(config.dispatch_policy, DispatchPolicy::Ancestry);

        let bad_policy = HashMap::from([(
            "SAFE_CALLBACK_DISPATCH_POLICY".to_string(),
            "fuzzy".to_string(),
        )]);
        assert!(matches!(
            GuardConfig::load_from(None, Some(bad_policy)),
            Err(GuardError::Configuration(_))
        ));
    }

    #[test]
    fn test_flag_spellings() {
        assert_eq!(parse_flag("ON"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let result = GuardConfig::load(Some(Path::new("/nonexistent/safe_callback.toml")));
        assert!(matches!(result, Err(GuardError::Configuration(_))));
    }
}
