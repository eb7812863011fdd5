use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt,
    path::{Path, PathBuf},
};
use tracing::info;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "codeflow.toml";

/// Default report destination, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "CODE_FLOW_ANALYSIS.md";

/// Character budget per analysis unit.
pub const DEFAULT_CHUNK_SIZE: usize = 15_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunk_size: usize,
    pub output_path: PathBuf,
    pub concurrency: usize,
    pub respect_gitignore: bool,
    pub write_json: bool,
    pub language: LanguageProfile,
    pub llm: LLMConfig,
}

/// Describes the target language: which files to pick up and what the
/// static analyzer looks for in them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageProfile {
    /// File extension without the leading dot.
    pub extension: String,
    /// Info string for fenced code blocks in prompts.
    pub fence: String,
    /// Literal marking a file that runs when executed directly.
    pub entry_point_marker: String,
    /// Line prefixes (after trimming) that identify import statements.
    pub import_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMProvider {
    Groq,
    OpenAI,
    Anthropic,
    Ollama,
}

impl LLMProvider {
    /// Environment variable consulted when the config file has no key.
    pub fn env_var(self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

impl fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Groq => "Groq",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        };
        f.write_str(name)
    }
}

/// Resolved credential for the narrative service. `None` only for providers
/// that do not authenticate.
#[derive(Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(Some(api_key.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential([REDACTED])"),
            None => f.write_str("Credential(None)"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            concurrency: 1,
            respect_gitignore: false,
            write_json: false,
            language: LanguageProfile::default(),
            llm: LLMConfig::default(),
        }
    }
}

impl Default for LanguageProfile {
    fn default() -> Self {
        Self::python()
    }
}

impl LanguageProfile {
    pub fn python() -> Self {
        Self {
            extension: "py".to_string(),
            fence: "python".to_string(),
            entry_point_marker: r#"if __name__ == "__main__":"#.to_string(),
            import_prefixes: vec!["import ".to_string(), "from ".to_string()],
        }
    }

    /// True if `path`'s file name ends with `.{extension}`.
    pub fn matches(&self, path: &Path) -> bool {
        let suffix = format!(".{}", self.extension.trim_start_matches('.'));
        path.file_name()
            .map(|name| name.to_string_lossy().ends_with(&suffix))
            .unwrap_or(false)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Groq,
            api_key: None,
            base_url: None,
            model: "llama3-8b-8192".to_string(),
            max_tokens: 4000,
            temperature: 0.1,
            timeout_seconds: 300,
        }
    }
}

impl Config {
    /// Load config from `path`. A missing file is an error: the credential
    /// lives there.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        info!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        if self.language.extension.trim_start_matches('.').is_empty() {
            return Err(Error::config("language.extension must not be empty"));
        }
        if self.language.import_prefixes.iter().any(|p| p.is_empty()) {
            return Err(Error::config("language.import_prefixes must not contain empty strings"));
        }
        Ok(())
    }

    /// Resolve the API key from the config file, falling back to the
    /// provider's environment variable.
    pub fn credential(&self) -> Result<Credential> {
        self.credential_with(|name| env::var(name).ok())
    }

    pub fn credential_with<F>(&self, lookup: F) -> Result<Credential>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = self.llm.provider;
        let Some(env_var) = provider.env_var() else {
            return Ok(Credential::none());
        };

        let key = self
            .llm
            .api_key
            .clone()
            .or_else(|| lookup(env_var))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        match key {
            None => Err(Error::MissingCredential {
                provider: provider.to_string(),
                env_var: env_var.to_string(),
            }),
            Some(value) if is_placeholder(&value) => Err(Error::PlaceholderCredential {
                provider: provider.to_string(),
                value,
            }),
            Some(value) => Ok(Credential::new(value)),
        }
    }

    /// Write the documented template to `path`, refusing to clobber an
    /// existing file.
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(Error::config(format!(
                "refusing to overwrite existing config at {}",
                path.display()
            )));
        }
        std::fs::write(path, Self::create_documented_config()).map_err(|source| {
            Error::WriteConfig {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Config file with all available options documented
    pub fn create_documented_config() -> String {
        r#"# codeflow configuration

# Maximum characters sent to the model per request. Larger files are split
# into consecutive chunks of this size.
chunk_size = 15000

# Report destination (overwritten on every run)
output_path = "CODE_FLOW_ANALYSIS.md"

# Number of files analyzed at once. Report order is unaffected.
concurrency = 1

# Skip files excluded by .gitignore
respect_gitignore = false

# Also write a JSON copy of the report next to the Markdown file
write_json = false

[language]
extension = "py"
fence = "python"
entry_point_marker = 'if __name__ == "__main__":'
import_prefixes = ["import ", "from "]

[llm]
# "Groq", "OpenAI", "Anthropic" or "Ollama"
provider = "Groq"

# API key (or set GROQ_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY)
api_key = "YOUR_GROQ_API_KEY"

# base_url = "http://localhost:11434"

model = "llama3-8b-8192"
max_tokens = 4000
temperature = 0.1

# Request timeout in seconds
timeout_seconds = 300
"#
        .to_string()
    }
}

fn is_placeholder(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    (upper.starts_with("YOUR_") && upper.ends_with("API_KEY"))
        || upper == "YOUR-API-KEY-HERE"
        || upper == "CHANGEME"
}
