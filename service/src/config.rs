use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default Gemini model used for both recordings and insights.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default Groq models: a vision-capable model for frame sequences, a text model
/// for insights and a speech-to-text model for transcripts.
pub const DEFAULT_GROQ_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_GROQ_TEXT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_TRANSCRIPTION_MODEL: &str = "whisper-large-v3-turbo";

/// Default OpenRouter model; must accept video URL parts.
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-001";

/// Backend that serves every inference call of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Groq,
    OpenRouter,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ProviderKindParseError;

impl FromStr for ProviderKind {
    type Err = ProviderKindParseError;
    fn from_str(kind: &str) -> Result<ProviderKind, Self::Err> {
        match kind.to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "groq" => Ok(ProviderKind::Groq),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            _ => Err(ProviderKindParseError),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::OpenRouter => write!(f, "openrouter"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Select the AI backend used for recording analysis and insights.
    #[arg(
        long = "ai-provider",
        env = "AI_PROVIDER",
        default_value_t = ProviderKind::Gemini,
        value_parser = clap::builder::PossibleValuesParser::new([
            "gemini", "groq", "openrouter",
            "GEMINI", "GROQ", "OPENROUTER"
        ])
            .map(|s| s.parse::<ProviderKind>().unwrap()),
    )]
    pub provider: ProviderKind,

    /// The API key to use when calling the Gemini API.
    #[arg(long, env, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// The base URL of the Gemini API.
    /// Override in tests to point at a mock server.
    #[arg(long, env)]
    gemini_base_url: Option<String>,

    /// The Gemini model identifier.
    #[arg(long, env, default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// The API key to use when calling the Groq API.
    #[arg(long, env, hide_env_values = true)]
    groq_api_key: Option<String>,

    /// The base URL of the Groq OpenAI-compatible API.
    #[arg(long, env)]
    groq_base_url: Option<String>,

    /// The Groq model that receives sampled video frames.
    #[arg(long, env, default_value = DEFAULT_GROQ_VISION_MODEL)]
    pub groq_vision_model: String,

    /// The Groq model used for text insights.
    #[arg(long, env, default_value = DEFAULT_GROQ_TEXT_MODEL)]
    pub groq_text_model: String,

    /// The Groq speech-to-text model used for recording transcripts.
    #[arg(long, env, default_value = DEFAULT_GROQ_TRANSCRIPTION_MODEL)]
    pub groq_transcription_model: String,

    /// The API key to use when calling the OpenRouter API.
    #[arg(long, env, hide_env_values = true)]
    openrouter_api_key: Option<String>,

    /// The base URL of the OpenRouter API.
    #[arg(long, env)]
    openrouter_base_url: Option<String>,

    /// The OpenRouter model identifier.
    #[arg(long, env, default_value = DEFAULT_OPENROUTER_MODEL)]
    pub openrouter_model: String,

    /// ISO-639-1 language hint passed to speech-to-text.
    #[arg(long, env, default_value = "en")]
    pub transcription_language: String,

    /// Deadline in seconds for a single inference or transcription request
    #[arg(long, env, default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Deadline in seconds for a single frame reachability probe
    #[arg(long, env, default_value_t = 5)]
    pub probe_timeout_secs: u64,

    /// Retries allowed after a rate-limited inference call
    #[arg(long, env, default_value_t = 2)]
    pub max_retries: u32,

    /// Override the provider's base backoff delay, in milliseconds
    #[arg(long, env)]
    pub retry_base_delay_ms: Option<u64>,

    /// Video offsets, in seconds, at which still frames are sampled.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "0,5,10,20,30"
    )]
    pub frame_offsets: Vec<u32>,

    /// Maximum number of frames sent with one inference call
    #[arg(long, env, default_value_t = 5)]
    pub max_frames: usize,

    /// Maximum tokens the model may generate per call
    #[arg(long, env, default_value_t = 2048)]
    pub max_tokens: u32,

    /// Sampling temperature for every inference call
    #[arg(long, env, default_value_t = 0.2)]
    pub temperature: f32,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    /// Returns the API key configured for `provider`, if any.
    pub fn api_key(&self, provider: ProviderKind) -> Option<String> {
        match provider {
            ProviderKind::Gemini => self.gemini_api_key.clone(),
            ProviderKind::Groq => self.groq_api_key.clone(),
            ProviderKind::OpenRouter => self.openrouter_api_key.clone(),
        }
    }

    pub fn set_api_key(mut self, provider: ProviderKind, api_key: Option<String>) -> Self {
        match provider {
            ProviderKind::Gemini => self.gemini_api_key = api_key,
            ProviderKind::Groq => self.groq_api_key = api_key,
            ProviderKind::OpenRouter => self.openrouter_api_key = api_key,
        }
        self
    }

    /// Returns the base URL override for `provider`, if configured.
    pub fn base_url(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::Gemini => self.gemini_base_url.as_deref(),
            ProviderKind::Groq => self.groq_base_url.as_deref(),
            ProviderKind::OpenRouter => self.openrouter_base_url.as_deref(),
        }
    }

    pub fn set_base_url(mut self, provider: ProviderKind, base_url: String) -> Self {
        match provider {
            ProviderKind::Gemini => self.gemini_base_url = Some(base_url),
            ProviderKind::Groq => self.groq_base_url = Some(base_url),
            ProviderKind::OpenRouter => self.openrouter_base_url = Some(base_url),
        }
        self
    }
}
