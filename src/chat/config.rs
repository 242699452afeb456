//! Configuration types for the chat application.
//!
//! Settings come from three places, later ones winning: built-in defaults, an optional
//! YAML file named by `--config`, and the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::Deserialize;

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};

/// Command-line arguments for the interpretalex-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the assistant API.
    #[arrrg(optional, "Assistant API base URL (default: http://localhost:3001/api/)", "URL")]
    pub api_url: Option<String>,

    /// Base URL of the auth endpoints.
    #[arrrg(optional, "Auth API base URL (default: the assistant API URL)", "URL")]
    pub auth_url: Option<String>,

    /// API key; falls back to INTERPRETALEX_API_KEY.
    #[arrrg(optional, "API key (default: $INTERPRETALEX_API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Where to persist the thread, counter and credentials.
    #[arrrg(optional, "JSON file for persistent state (default: in memory)", "PATH")]
    pub store: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log requests and decoded responses to stderr.
    #[arrrg(flag, "Log requests and decoded responses to stderr")]
    pub verbose: bool,
}

/// The YAML configuration file.  Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    auth_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    store: Option<PathBuf>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    no_color: bool,
    #[serde(default)]
    verbose: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the assistant API.
    pub api_url: String,

    /// Base URL of the auth endpoints.  `None` means the assistant API URL.
    pub auth_url: Option<String>,

    /// API key.  `None` means read it from the environment.
    pub api_key: Option<String>,

    /// JSON file for persistent state.  `None` keeps state in memory.
    pub store_path: Option<PathBuf>,

    /// Request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log client activity to stderr.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: None,
            api_key: None,
            store_path: None,
            timeout: DEFAULT_TIMEOUT,
            use_color: true,
            verbose: false,
        }
    }

    /// Loads a configuration from a YAML file, filling unset fields with defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config file {}", path.display()), err)
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Parses a YAML configuration, filling unset fields with defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = if yaml.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let mut config = ChatConfig::new();
        if let Some(api_url) = file.api_url {
            config.api_url = api_url;
        }
        config.auth_url = file.auth_url;
        config.api_key = file.api_key;
        config.store_path = file.store;
        if let Some(secs) = file.timeout {
            config.timeout = timeout_from_secs(secs)?;
        }
        config.use_color = !file.no_color;
        config.verbose = file.verbose;
        Ok(config)
    }

    /// Resolves the full configuration: the file named by `--config`, if any, with
    /// command-line values on top.
    pub fn resolve(args: ChatArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::new(),
        };
        base.apply_args(args)
    }

    fn apply_args(mut self, args: ChatArgs) -> Result<Self> {
        if let Some(api_url) = args.api_url {
            self.api_url = api_url;
        }
        if let Some(auth_url) = args.auth_url {
            self.auth_url = Some(auth_url);
        }
        if let Some(api_key) = args.api_key {
            self.api_key = Some(api_key);
        }
        if let Some(store) = args.store {
            self.store_path = Some(PathBuf::from(store));
        }
        if let Some(secs) = args.timeout {
            self.timeout = timeout_from_secs(secs)?;
        }
        if args.no_color {
            self.use_color = false;
        }
        if args.verbose {
            self.verbose = true;
        }
        Ok(self)
    }

    /// Sets the assistant API URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the auth API URL.
    pub fn with_auth_url(mut self, auth_url: Option<String>) -> Self {
        self.auth_url = auth_url;
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Sets the state file.
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        self.store_path = path;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Enables logging to stderr.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ChatArgs> for ChatConfig {
    type Error = Error;

    /// Applies command-line values over the defaults, ignoring `--config`.
    fn try_from(args: ChatArgs) -> Result<Self> {
        ChatConfig::new().apply_args(args)
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::validation(
            "timeout must be at least one second",
            Some("timeout".to_string()),
        ));
    }
    Ok(Duration::from_secs(secs))
}
