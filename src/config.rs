use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub sandbox: SandboxConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SandboxConfig {
    /// "docker" for a container, "process" for a scratch directory on the host.
    pub backend: String,
    pub container: String,
    /// Destination directory inside the sandbox where files are staged.
    /// For the process backend this is the scratch directory itself.
    pub dest_dir: String,
    pub python: String,
    /// Wall-clock limit for one execution. Absent means unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Process backend only: allow network access instead of unsharing
    /// the network namespace.
    #[serde(default)]
    pub network: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilesConfig {
    /// The only host directory files may be staged from.
    pub data_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "ollama".to_string(),
                model: "qwen2.5:7b".to_string(),
                base_url: "http://localhost:11434".to_string(),
                api_key: None,
            },
            agent: AgentConfig { max_iterations: 10 },
            sandbox: SandboxConfig {
                backend: "docker".to_string(),
                container: "tidepool-sandbox".to_string(),
                dest_dir: "/home/sandbox".to_string(),
                python: "python3".to_string(),
                timeout_secs: None,
                network: false,
            },
            files: FilesConfig {
                data_dir: "./data".to_string(),
            },
        }
    }
}

impl Config {
    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load config from ~/.tidepool/config.toml, falling back to defaults.
    pub fn load() -> Self {
        let config_path = if let Some(home) = dirs::home_dir() {
            home.join(".tidepool").join("config.toml")
        } else {
            return Self::default();
        };

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!(
                            "Warning: Failed to parse {}: {}. Using defaults.",
                            config_path.display(),
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to read {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }
}
