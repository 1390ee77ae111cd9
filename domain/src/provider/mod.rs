//! Concrete inference backends and their selection.
//!
//! Each backend implements both [`chat::Provider`] and [`video::Analyzer`].
//! [`ProviderFactory`] picks one from [`Config::provider`] and caches it; it is
//! meant to live at the composition root, with the resolved handles passed on
//! to the insight engine and video analysis by the caller.

pub mod gemini;
pub mod groq;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use openrouter::OpenRouterProvider;

use crate::error::Error;
use log::*;
use provider_auth::api_key::{require_api_key, ApiKeyProvider};
use report_ai::traits::frames::CloudinaryFrames;
use report_ai::traits::{chat, video};
use report_ai::types::chat::{ChatRequest, Message};
use report_ai::RetryPolicy;
use secrecy::SecretString;
use service::config::{Config, ProviderKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-call knobs shared by every backend.
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl InferenceSettings {
    /// Settings from `config`, falling back to the vendor's `base_delay` unless
    /// a backoff override is configured.
    pub fn from_config(config: &Config, base_delay: Duration) -> Self {
        let base_delay = config
            .retry_base_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(base_delay);
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            retry: RetryPolicy::new(base_delay).with_max_retries(config.max_retries),
        }
    }

    pub fn request(&self, system: &str, user: Message) -> ChatRequest {
        ChatRequest::new(system, user)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

/// Read the API key for `kind`, failing fast when it is missing.
pub(crate) fn api_key_for(config: &Config, kind: ProviderKind) -> Result<SecretString, Error> {
    let provider = match kind {
        ProviderKind::Gemini => ApiKeyProvider::Gemini,
        ProviderKind::Groq => ApiKeyProvider::Groq,
        ProviderKind::OpenRouter => ApiKeyProvider::OpenRouter,
    };
    Ok(require_api_key(
        provider,
        config.api_key(kind).map(SecretString::from),
    )?)
}

/// The active backend, viewed through both capabilities.
#[derive(Clone)]
pub struct ProviderSet {
    pub kind: ProviderKind,
    pub chat: Arc<dyn chat::Provider>,
    pub video: Arc<dyn video::Analyzer>,
}

impl ProviderSet {
    /// Construct the backend named by `config.provider`.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        info!("Constructing {} provider", config.provider);
        match config.provider {
            ProviderKind::Gemini => Ok(Self::of(
                ProviderKind::Gemini,
                Arc::new(GeminiProvider::from_config(config)?),
            )),
            ProviderKind::Groq => Ok(Self::of(
                ProviderKind::Groq,
                Arc::new(GroqProvider::from_config(config, Arc::new(CloudinaryFrames))?),
            )),
            ProviderKind::OpenRouter => Ok(Self::of(
                ProviderKind::OpenRouter,
                Arc::new(OpenRouterProvider::from_config(config)?),
            )),
        }
    }

    fn of<P>(kind: ProviderKind, provider: Arc<P>) -> Self
    where
        P: chat::Provider + video::Analyzer + 'static,
    {
        Self {
            kind,
            chat: provider.clone(),
            video: provider,
        }
    }
}

/// Resolves the configured backend once and hands out the cached set until reset.
pub struct ProviderFactory {
    config: Config,
    cached: Mutex<Option<ProviderSet>>,
}

impl ProviderFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cached: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolve(&self) -> Result<ProviderSet, Error> {
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(set) = cached.as_ref() {
            return Ok(set.clone());
        }

        let set = ProviderSet::from_config(&self.config)?;
        *cached = Some(set.clone());
        Ok(set)
    }

    /// Drop the cached backend so the next [`ProviderFactory::resolve`] rebuilds it.
    pub fn reset(&self) {
        debug!("Resetting cached {} provider", self.config.provider);
        *self
            .cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    /// Swap the configuration and drop the cached backend.
    pub fn reconfigure(&mut self, config: Config) {
        self.config = config;
        self.reset();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use clap::Parser;
    use serial_test::serial;

    /// Config with no keys from the environment and fast retries.
    pub(crate) fn test_config(provider: ProviderKind) -> Config {
        let mut config = Config::parse_from(["report_insights_rs"])
            .set_provider(provider)
            .set_api_key(ProviderKind::Gemini, None)
            .set_api_key(ProviderKind::Groq, None)
            .set_api_key(ProviderKind::OpenRouter, None);
        config.retry_base_delay_ms = Some(1);
        config.request_timeout_secs = 5;
        config.probe_timeout_secs = 2;
        config
    }

    fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
        Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
    }

    #[test]
    fn test_resolve_is_cached_until_reset() {
        let config =
            test_config(ProviderKind::Groq).set_api_key(ProviderKind::Groq, Some("gsk_test".to_string()));
        let factory = ProviderFactory::new(config);

        let first = factory.resolve().unwrap();
        let second = factory.resolve().unwrap();
        assert_eq!(first.kind, ProviderKind::Groq);
        assert!(same(&first.chat, &second.chat));
        assert_eq!(first.chat.provider_id(), "groq");

        factory.reset();
        let third = factory.resolve().unwrap();
        assert!(!same(&first.chat, &third.chat));
    }

    #[test]
    fn test_missing_api_key_fails_at_construction() {
        for kind in [ProviderKind::Gemini, ProviderKind::Groq, ProviderKind::OpenRouter] {
            let err = ProviderSet::from_config(&test_config(kind)).err().unwrap();
            assert_eq!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::Config)
            );
        }
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = test_config(ProviderKind::OpenRouter)
            .set_api_key(ProviderKind::OpenRouter, Some("   ".to_string()));
        assert!(ProviderSet::from_config(&config).is_err());
    }

    #[test]
    fn test_reconfigure_switches_backend() {
        let mut factory = ProviderFactory::new(
            test_config(ProviderKind::Gemini).set_api_key(ProviderKind::Gemini, Some("AIza".to_string())),
        );
        assert_eq!(factory.resolve().unwrap().kind, ProviderKind::Gemini);

        factory.reconfigure(
            test_config(ProviderKind::OpenRouter)
                .set_api_key(ProviderKind::OpenRouter, Some("sk-or".to_string())),
        );
        let set = factory.resolve().unwrap();
        assert_eq!(set.kind, ProviderKind::OpenRouter);
        assert_eq!(set.video.provider_id(), "openrouter");
    }

    #[test]
    #[serial]
    fn test_provider_and_key_read_from_environment() {
        std::env::set_var("AI_PROVIDER", "openrouter");
        std::env::set_var("OPENROUTER_API_KEY", "sk-or-env");

        let config = Config::parse_from(["report_insights_rs"]);
        let set = ProviderSet::from_config(&config);

        std::env::remove_var("AI_PROVIDER");
        std::env::remove_var("OPENROUTER_API_KEY");

        let set = set.unwrap();
        assert_eq!(set.kind, ProviderKind::OpenRouter);
        assert_eq!(set.chat.provider_id(), "openrouter");
    }

    #[test]
    fn test_settings_cap_configured_retries() {
        let mut config = test_config(ProviderKind::Groq);
        config.max_retries = 6;
        let settings = InferenceSettings::from_config(&config, Duration::from_millis(1));
        assert_eq!(settings.retry.max_retries(), report_ai::MAX_RETRIES);

        config.max_retries = 1;
        let settings = InferenceSettings::from_config(&config, Duration::from_millis(1));
        assert_eq!(settings.retry.max_retries(), 1);
    }

    #[test]
    fn test_settings_honor_backoff_override() {
        let mut config = test_config(ProviderKind::Gemini);
        config.retry_base_delay_ms = None;
        let settings = InferenceSettings::from_config(&config, Duration::from_secs(5));
        assert_eq!(
            settings.retry.clone().without_jitter().backoff_delay(0),
            Duration::from_secs(5)
        );

        config.retry_base_delay_ms = Some(250);
        let settings = InferenceSettings::from_config(&config, Duration::from_secs(5));
        assert_eq!(
            settings.retry.without_jitter().backoff_delay(1),
            Duration::from_millis(500)
        );
    }
}
