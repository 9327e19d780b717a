//! Layered config loading.
//!
//! The project config is found by walking up from the start directory and
//! taking the first directory holding one of [`CANDIDATES`]. A `package.json`
//! only counts when it has an `imagemin` key.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use tracing::debug;

use super::{ConfigError, ConfigOverrides, MinifyConfig};

/// Key under which `package.json` carries the config
pub const CONFIG_NAME: &str = "imagemin";

const ENV_PREFIX: &str = "IMAGEMIN_";

/// File names probed in each directory, in priority order.
const CANDIDATES: [&str; 8] = [
    "package.json",
    ".imageminrc",
    ".imageminrc.json",
    ".imageminrc.yaml",
    ".imageminrc.yml",
    ".imageminrc.toml",
    "imagemin.config.json",
    "imagemin.config.toml",
];

/// Where the project layer of a loaded config came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No project config; built-in defaults only
    Defaults,
    /// The `imagemin` key of a `package.json`
    PackageJson(PathBuf),
    /// A dedicated config file
    File(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Json,
    Yaml,
    Toml,
}

impl Syntax {
    fn of(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name == ".imageminrc" {
            // extensionless rc files are YAML, which also accepts JSON
            return Some(Self::Yaml);
        }
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Builder for a [`MinifyConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    start_dir: Option<PathBuf>,
    ceiling: Option<PathBuf>,
    explicit: Option<PathBuf>,
    overrides: ConfigOverrides,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            start_dir: None,
            ceiling: None,
            explicit: None,
            overrides: ConfigOverrides::default(),
            use_env: true,
        }
    }

    /// Directory the upward search starts from. Defaults to the working directory.
    pub fn start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(dir.into());
        self
    }

    /// Last directory the upward search looks in. Defaults to the filesystem root.
    pub fn ceiling(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ceiling = Some(dir.into());
        self
    }

    /// Use this file instead of searching. Its extension picks the parser.
    pub fn explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    /// Call-site overrides; these beat the environment.
    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Skip the `IMAGEMIN_*` environment layer.
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn load(&self) -> Result<MinifyConfig, ConfigError> {
        self.load_with_source().map(|(config, _)| config)
    }

    pub fn load_with_source(&self) -> Result<(MinifyConfig, ConfigSource), ConfigError> {
        let start = match &self.start_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| ConfigError::invalid("startDir", e.to_string()))?,
        };

        let source = match &self.explicit {
            Some(path) => explicit_source(&start, path)?,
            None => discover(&start, self.ceiling.as_deref())?,
        };
        debug!("Config source: {:?}", source);

        let mut figment = Figment::from(Serialized::defaults(MinifyConfig::default()));
        figment = match &source {
            ConfigSource::Defaults => figment,
            ConfigSource::PackageJson(path) => {
                let block: serde_json::Value =
                    Figment::from(Json::file(path)).extract_inner(CONFIG_NAME)?;
                figment.merge(Serialized::defaults(block))
            }
            ConfigSource::File(path) => match Syntax::of(path) {
                Some(Syntax::Json) => figment.merge(Json::file(path)),
                Some(Syntax::Yaml) => figment.merge(Yaml::file(path)),
                Some(Syntax::Toml) => figment.merge(Toml::file(path)),
                None => return Err(unsupported(path)),
            },
        };
        if self.use_env {
            // Only single-word keys line up with camelCase fields here, e.g.
            // IMAGEMIN_JPEG__QUALITY. Policy scalars go through the overrides.
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        let mut config: MinifyConfig = figment.extract()?;

        let overrides = if self.use_env {
            self.overrides.clone().or(env_overrides()?)
        } else {
            self.overrides.clone()
        };
        config.apply(&overrides);
        config.validate()?;

        Ok((config, source))
    }
}

/// Policy overrides read from `IMAGEMIN_SKIP_DELTA`, `IMAGEMIN_SILENT_ERRORS`
/// and `IMAGEMIN_SHOW_SAVINGS`.
pub fn env_overrides() -> Result<ConfigOverrides, ConfigError> {
    Ok(Figment::from(Env::prefixed(ENV_PREFIX)).extract()?)
}

fn explicit_source(start: &Path, path: &Path) -> Result<ConfigSource, ConfigError> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        start.join(path)
    };
    if !path.is_file() {
        return Err(ConfigError::NotFound(path));
    }
    if path.file_name().and_then(|n| n.to_str()) == Some("package.json") {
        return Ok(ConfigSource::PackageJson(path));
    }
    match Syntax::of(&path) {
        Some(_) => Ok(ConfigSource::File(path)),
        None => Err(unsupported(&path)),
    }
}

fn discover(start: &Path, ceiling: Option<&Path>) -> Result<ConfigSource, ConfigError> {
    let mut current = start;
    loop {
        for name in CANDIDATES {
            let candidate = current.join(name);
            if !candidate.is_file() {
                continue;
            }
            if name == "package.json" {
                if Figment::from(Json::file(&candidate)).contains(CONFIG_NAME) {
                    return Ok(ConfigSource::PackageJson(candidate));
                }
                continue;
            }
            return Ok(ConfigSource::File(candidate));
        }

        if ceiling == Some(current) {
            return Ok(ConfigSource::Defaults);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Ok(ConfigSource::Defaults),
        }
    }
}

fn unsupported(path: &Path) -> ConfigError {
    ConfigError::invalid(
        "config",
        format!(
            "unsupported config file '{}' (expected .json, .yaml, .yml or .toml)",
            path.display()
        ),
    )
}
