use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const RC_ENV: &str = "TIDELINERC";
pub const BASE_URL_ENV: &str =
  "TIDELINE_API_BASE_URL";

const DEFAULTS: &[(&str, &str)] = &[
  ("api.base_url", "http://localhost:3000"),
  ("api.timeout_seconds", "30"),
  ("data.location", "~/.tideline"),
  ("session.poll_seconds", "5"),
  ("session.countdown_seconds", "3"),
  ("session.login_path", "/login"),
  ("color", "on")
];

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      map:          DEFAULTS
        .iter()
        .map(|(k, v)| {
          (k.to_string(), v.to_string())
        })
        .collect(),
      loaded_files: vec![]
    }
  }
}

impl Config {
  /// Defaults, then the rc file, then
  /// the base URL from the environment.
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override,
      std::env::var(RC_ENV).ok()
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading tidelinerc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no tidelinerc found; using \
         defaults"
      );
    }

    cfg.apply_base_url_env(
      std::env::var(BASE_URL_ENV).ok()
    );
    Ok(cfg)
  }

  fn apply_base_url_env(
    &mut self,
    value: Option<String>
  ) {
    if let Some(url) = value
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
    {
      debug!(url = %url, "base url from environment");
      self
        .map
        .insert("api.base_url".to_string(), url);
    }
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn get_u64(
    &self,
    key: &str
  ) -> anyhow::Result<Option<u64>> {
    self
      .map
      .get(key)
      .map(|v| {
        v.trim().parse::<u64>().with_context(
          || {
            format!(
              "{key} must be a \
               non-negative integer, \
               got {v:?}"
            )
          }
        )
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = match raw_line
        .split_once('#')
      {
        | Some((before, _)) => {
          before.trim()
        }
        | None => raw_line.trim()
      };
      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        if include_path == path {
          warn!(include = %include_path.display(), "rc file includes itself; skipping");
          continue;
        }
        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

/// Typed view of the keys the client
/// and the watchdog read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
  pub base_url:       String,
  pub timeout:        Duration,
  pub poll_interval:  Duration,
  pub countdown_secs: u64,
  pub login_path:     String,
  pub color:          bool
}

impl ClientSettings {
  pub fn from_config(
    cfg: &Config
  ) -> anyhow::Result<Self> {
    let base_url = cfg
      .get("api.base_url")
      .map(|v| {
        v.trim().trim_end_matches('/').to_string()
      })
      .filter(|v| !v.is_empty())
      .ok_or_else(|| {
        anyhow!("api.base_url is empty")
      })?;
    if !base_url.starts_with("http://")
      && !base_url.starts_with("https://")
    {
      return Err(anyhow!(
        "api.base_url must be an http(s) \
         URL, got {base_url:?}"
      ));
    }

    let poll_secs = cfg
      .get_u64("session.poll_seconds")?
      .unwrap_or(5);
    if poll_secs == 0 {
      return Err(anyhow!(
        "session.poll_seconds must be at \
         least 1"
      ));
    }

    Ok(Self {
      base_url,
      timeout: Duration::from_secs(
        cfg
          .get_u64("api.timeout_seconds")?
          .unwrap_or(30)
      ),
      poll_interval: Duration::from_secs(
        poll_secs
      ),
      countdown_secs: cfg
        .get_u64(
          "session.countdown_seconds"
        )?
        .unwrap_or(3),
      login_path: cfg
        .get("session.login_path")
        .unwrap_or_else(|| {
          "/login".to_string()
        }),
      color: cfg
        .get_bool("color")
        .unwrap_or(true)
    })
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

fn resolve_rc_path(
  override_path: Option<&Path>,
  env_value: Option<String>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Some(rc_env) = env_value {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping tidelinerc"
    );
    return Ok(None);
  };
  let candidate =
    home.join(".tidelinerc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  Ok(home.join(".tideline"))
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}
