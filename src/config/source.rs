//! Configuration file discovery and loading.

use super::{ConfigError, ServerConfig};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "A2A_CONFIG_PATH";

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "agora.toml";

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// The `--config` command line flag.
    CommandLine(Utf8PathBuf),
    /// The [`CONFIG_PATH_ENV`] environment variable.
    Environment(Utf8PathBuf),
    /// [`DEFAULT_CONFIG_FILE`] in the working directory.
    WorkingDirectory(Utf8PathBuf),
    /// No file; built-in defaults only.
    Defaults,
}

impl ConfigSource {
    /// Returns the file backing this source, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::CommandLine(path) | Self::Environment(path) | Self::WorkingDirectory(path) => {
                Some(path.as_path())
            }
            Self::Defaults => None,
        }
    }

    fn resolve<F>(cli_path: Option<&Utf8Path>, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = cli_path {
            return Self::CommandLine(path.to_owned());
        }
        if let Some(path) = lookup(CONFIG_PATH_ENV).filter(|value| !value.trim().is_empty()) {
            return Self::Environment(Utf8PathBuf::from(path));
        }
        let in_working_dir = Dir::open_ambient_dir(".", ambient_authority())
            .map(|dir| dir.is_file(DEFAULT_CONFIG_FILE))
            .unwrap_or(false);
        if in_working_dir {
            return Self::WorkingDirectory(Utf8PathBuf::from(DEFAULT_CONFIG_FILE));
        }
        Self::Defaults
    }
}

impl ServerConfig {
    /// Loads, overrides and validates configuration from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an
    /// override is malformed or validation fails.
    pub fn load(cli_path: Option<&Utf8Path>) -> Result<(Self, ConfigSource), ConfigError> {
        Self::load_with(cli_path, |key| std::env::var(key).ok())
    }

    /// Loads configuration reading environment variables through `lookup`.
    ///
    /// The file is chosen from `cli_path`, then [`CONFIG_PATH_ENV`], then
    /// [`DEFAULT_CONFIG_FILE`] in the working directory. Without any of
    /// them the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an
    /// override is malformed or validation fails.
    pub fn load_with<F>(
        cli_path: Option<&Utf8Path>,
        lookup: F,
    ) -> Result<(Self, ConfigSource), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = ConfigSource::resolve(cli_path, &lookup);
        let mut config = match source.path() {
            Some(path) => read_config_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok((config, source))
    }
}

fn read_config_file(path: &Utf8Path) -> Result<ServerConfig, ConfigError> {
    let read_error = |source: std::io::Error| ConfigError::Read {
        path: path.to_owned(),
        source,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(std::io::Error::other("path must include a file name")))?;
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let text = dir.read_to_string(file_name).map_err(read_error)?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source: Box::new(source),
    })
}
