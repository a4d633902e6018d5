use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use grcpilot_core::{AppError, AppResult, UserIdentity};
use grcpilot_domain::InferenceOptions;
use grcpilot_infrastructure::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub ollama_url: String,
    pub model_id: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub options: InferenceOptions,
    pub session_user: Option<UserIdentity>,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let ollama_url = optional_var(&lookup, "OLLAMA_URL")
            .unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let model_id =
            optional_var(&lookup, "OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_owned());

        let request_timeout_seconds = parse_var(&lookup, "OLLAMA_TIMEOUT_SECONDS", 60_u64)?;
        let health_timeout_seconds = parse_var(&lookup, "OLLAMA_HEALTH_TIMEOUT_SECONDS", 5_u64)?;
        require_positive("OLLAMA_TIMEOUT_SECONDS", request_timeout_seconds)?;
        require_positive("OLLAMA_HEALTH_TIMEOUT_SECONDS", health_timeout_seconds)?;

        let defaults = InferenceOptions::default();
        let options = InferenceOptions {
            temperature: parse_var(&lookup, "OLLAMA_TEMPERATURE", defaults.temperature)?,
            top_p: parse_var(&lookup, "OLLAMA_TOP_P", defaults.top_p)?,
        };

        let session_user = optional_var(&lookup, "GRC_USER_ID").map(|user_id| {
            let display_name =
                optional_var(&lookup, "GRC_USER_NAME").unwrap_or_else(|| user_id.clone());
            UserIdentity::new(
                user_id,
                display_name,
                optional_var(&lookup, "GRC_USER_EMAIL"),
            )
        });

        Ok(Self {
            ollama_url,
            model_id,
            request_timeout: Duration::from_secs(request_timeout_seconds),
            health_timeout: Duration::from_secs(health_timeout_seconds),
            options,
            session_user,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn optional_var(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn require_positive(name: &str, value: u64) -> AppResult<()> {
    if value == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(())
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match optional_var(lookup, name) {
        Some(value) => value.parse::<T>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use grcpilot_core::{AppError, UserIdentity};

    use super::CliConfig;

    fn load(vars: &[(&str, &str)]) -> Result<CliConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        CliConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.model_id, "llama3.2");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert!((config.options.temperature - 0.7).abs() < f32::EPSILON);
        assert!((config.options.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.session_user, None);
    }

    #[test]
    fn overrides_are_read_and_url_is_trimmed() {
        let config = load(&[
            ("OLLAMA_URL", "http://gpu-box:11434/"),
            ("OLLAMA_MODEL", "mistral"),
            ("OLLAMA_TIMEOUT_SECONDS", "120"),
            ("OLLAMA_TEMPERATURE", "0.2"),
        ])
        .unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model_id, "mistral");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert!((config.options.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn session_user_is_built_from_user_variables() {
        let config = load(&[
            ("GRC_USER_ID", "U-42"),
            ("GRC_USER_NAME", "Morgan Lee"),
            ("GRC_USER_EMAIL", "morgan@example.com"),
        ])
        .unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(
            config.session_user,
            Some(UserIdentity::new(
                "U-42",
                "Morgan Lee",
                Some("morgan@example.com".to_owned())
            ))
        );
    }

    #[test]
    fn user_name_falls_back_to_user_id() {
        let config = load(&[("GRC_USER_ID", "U-42")]).unwrap_or_else(|error| panic!("{error}"));

        assert_eq!(
            config.session_user.map(|user| user.display_name().to_owned()),
            Some("U-42".to_owned())
        );
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let error = load(&[("OLLAMA_TIMEOUT_SECONDS", "soon")]).err();

        assert!(matches!(
            error,
            Some(AppError::Validation(message)) if message.contains("OLLAMA_TIMEOUT_SECONDS")
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let error = load(&[("OLLAMA_HEALTH_TIMEOUT_SECONDS", "0")]).err();

        assert!(matches!(
            error,
            Some(AppError::Validation(message)) if message.contains("greater than zero")
        ));
    }
}
