use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

const CONFIG_ENV_VAR: &str =
  "CHERRY_CONFIG";
const DEFAULT_DATA_LOCATION: &str =
  "~/.cherry";

#[derive(
  Debug, Clone, Default, Deserialize,
)]
pub struct Config {
  /// "on"/"off" (and the usual
  /// yes/no/true/false spellings).
  pub color: Option<String>,

  /// View opened when `list` is run
  /// without `--view`.
  pub default_view: Option<String>,

  pub data: Option<DataSection>
}

#[derive(
  Debug, Clone, Default, Deserialize,
)]
pub struct DataSection {
  pub location: Option<String>
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(
        config_override
      )
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let raw = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read config file \
         {}",
        path.display()
      )
    })?;

    Self::parse(&raw).with_context(
      || {
        format!(
          "failed to parse config \
           file {}",
          path.display()
        )
      }
    )
  }

  pub fn parse(
    raw: &str
  ) -> anyhow::Result<Self> {
    let cfg: Config =
      toml::from_str(raw)?;
    debug!(?cfg, "parsed config");
    Ok(cfg)
  }
}

fn resolve_config_path(
  config_override: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = config_override {
    return Some(path.to_path_buf());
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join("cherry")
    .join("config.toml");
  if candidate.exists() {
    Some(candidate)
  } else {
    None
  }
}

/// Data directory hosting the task
/// snapshot and activity logs: CLI
/// flag wins, then the config's
/// `[data] location`, then `~/.cherry`.
#[tracing::instrument(skip(
  cfg,
  cli_override
))]
pub fn resolve_data_dir(
  cfg: &Config,
  cli_override: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = cli_override {
    return Ok(expand_tilde(path));
  }

  let location = cfg
    .data
    .as_ref()
    .and_then(|section| {
      section.location.clone()
    })
    .unwrap_or_else(|| {
      DEFAULT_DATA_LOCATION.to_string()
    });

  Ok(expand_tilde(Path::new(
    &location
  )))
}

fn expand_tilde(path: &Path) -> PathBuf {
  let Some(raw) = path.to_str() else {
    return path.to_path_buf();
  };

  if raw == "~" {
    return dirs::home_dir()
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });
  }

  if let Some(rest) =
    raw.strip_prefix("~/")
  {
    return dirs::home_dir()
      .unwrap_or_else(|| {
        PathBuf::from(".")
      })
      .join(rest);
  }

  path.to_path_buf()
}
