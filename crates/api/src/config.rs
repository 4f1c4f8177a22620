use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub mode: OperationMode,
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub vision: VisionConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Fast,      // Aggressive embedding cache, short timeouts
    Accurate,  // Always fresh embeddings, patient retries
    Balanced,  // Default
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    /// Root for the stored comparison reports.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub vision_model: String,
    pub text_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            max_upload_bytes: 16 * 1024 * 1024,
            data_dir: "data".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
        }
    }
}

impl VisionConfig {
    fn with_timeout(request_timeout_secs: u64) -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            vision_model: "llama-3.2-90b-vision-preview".to_string(),
            text_model: "llama-3.2-90b".to_string(),
            request_timeout_secs,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Balanced,
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            vision: VisionConfig::with_timeout(60),
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
        }
    }
}

impl AppConfig {
    pub fn fast_mode() -> Self {
        Self {
            mode: OperationMode::Fast,
            vision: VisionConfig::with_timeout(30),
            retry: RetryConfig {
                max_retries: 2,
                initial_backoff_ms: 500,
                max_backoff_ms: 5000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 50000,
            },
            ..Self::default()
        }
    }

    pub fn accurate_mode() -> Self {
        Self {
            mode: OperationMode::Accurate,
            vision: VisionConfig::with_timeout(120),
            retry: RetryConfig {
                max_retries: 5,
                initial_backoff_ms: 2000,
                max_backoff_ms: 20000,
            },
            cache: CacheConfig {
                enabled: false,
                max_entries: 0,
            },
            ..Self::default()
        }
    }

    pub fn for_mode(mode: OperationMode) -> Self {
        match mode {
            OperationMode::Fast => Self::fast_mode(),
            OperationMode::Balanced => Self::default(),
            OperationMode::Accurate => Self::accurate_mode(),
        }
    }

    /// Load `.env` if present, then read `MEDCOMPARE_*` and `GROQ_API_KEY`.
    /// Reads the process environment; `.env` is loaded once by the binary before this runs.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup("MEDCOMPARE_MODE").as_deref().map(str::to_lowercase).as_deref() {
            Some("fast") => OperationMode::Fast,
            Some("accurate") => OperationMode::Accurate,
            Some("balanced") | None => OperationMode::Balanced,
            Some(other) => {
                tracing::warn!(mode = other, "Unknown MEDCOMPARE_MODE, using balanced");
                OperationMode::Balanced
            }
        };
        let mut config = Self::for_mode(mode);

        if let Some(v) = lookup("MEDCOMPARE_BIND_ADDR") {
            config.server.bind_addr = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_DATA_DIR") {
            config.server.data_dir = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_MAX_UPLOAD_BYTES").and_then(|v| v.parse().ok()) {
            config.server.max_upload_bytes = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_EMBEDDING_URL") {
            config.embedding.base_url = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_EMBEDDING_MODEL") {
            config.embedding.model = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_VISION_URL") {
            config.vision.base_url = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_VISION_MODEL") {
            config.vision.vision_model = v;
        }
        if let Some(v) = lookup("MEDCOMPARE_TEXT_MODEL") {
            config.vision.text_model = v;
        }
        config.vision.api_key = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty());

        config
    }
}
