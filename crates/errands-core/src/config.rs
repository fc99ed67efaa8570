use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

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

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "default.command".to_string(),
      "lists".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_rc_path(rc_override)?
    {
      Some(path) => {
        info!(errandsrc = %path.display(), "loading errandsrc");
        cfg.load_file(&path)?;
      }
      None => {
        warn!(
          "no errandsrc found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
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
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      self.map.insert(key, value);
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
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(key, v))
      .transpose()
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let path = fs::canonicalize(&path)
      .unwrap_or(path);
    if self.loaded_files.contains(&path) {
      warn!(file = %path.display(), "errandsrc already loaded; skipping repeat include");
      return Ok(());
    }
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
      .map(Path::to_path_buf)
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      if let Some(include) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include.trim()
          )?;
        if include_path.exists() {
          debug!(include = %include_path.display(), "processing include");
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

/// Picks the data directory: `--data`, then `data.location`, then the
/// platform data dir. Creates it when missing.
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
  } else if let Some(location) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&location))
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
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(from_env) =
    std::env::var("ERRANDSRC")
  {
    if from_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      from_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate =
    home.join(".errandsrc");
  Ok(
    candidate
      .exists()
      .then_some(candidate)
  )
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let base = dirs::data_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory"
      )
    })?;
  Ok(base.join("errands"))
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

fn parse_bool(
  key: &str,
  value: &str
) -> anyhow::Result<bool> {
  match value
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Ok(true),
    | "0" | "n" | "no" | "off"
    | "false" => Ok(false),
    | other => Err(anyhow!(
      "invalid boolean for {key}: \
       {other}"
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn reads_keys_comments_and_includes()
  {
    let temp =
      tempdir().expect("tempdir");
    let extra =
      temp.path().join("extra.rc");
    fs::write(&extra, "color = off\n")
      .expect("write include");
    let main =
      temp.path().join("errandsrc");
    fs::write(
      &main,
      "# errands settings\n\
       data.location = /tmp/errands # inline\n\
       \n\
       include extra.rc\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&main))
      .expect("load");
    assert_eq!(
      cfg.get("data.location")
        .as_deref(),
      Some("/tmp/errands")
    );
    assert_eq!(
      cfg.get_bool("color")
        .expect("bool"),
      Some(false)
    );
    assert_eq!(
      cfg.get("default.command")
        .as_deref(),
      Some("lists")
    );
    assert_eq!(
      cfg.loaded_files.len(),
      2
    );
  }

  #[test]
  fn include_cycles_load_each_file_once()
  {
    let temp =
      tempdir().expect("tempdir");
    let first =
      temp.path().join("first.rc");
    let second =
      temp.path().join("second.rc");
    fs::write(
      &first,
      "color = off
include second.rc
"
    )
    .expect("write first");
    fs::write(
      &second,
      "default.command = menu
       include first.rc
       include ./second.rc
"
    )
    .expect("write second");

    let cfg = Config::load(Some(&first))
      .expect("load");
    assert_eq!(
      cfg.loaded_files.len(),
      2
    );
    assert_eq!(
      cfg.get("default.command")
        .as_deref(),
      Some("menu")
    );
    assert_eq!(
      cfg.get_bool("color")
        .expect("bool"),
      Some(false)
    );
  }

  #[test]
  fn malformed_line_names_location() {
    let temp =
      tempdir().expect("tempdir");
    let rc =
      temp.path().join("errandsrc");
    fs::write(&rc, "color\n")
      .expect("write rc");

    let err = Config::load(Some(&rc))
      .expect_err("malformed");
    assert!(
      err.to_string().contains(":1:")
    );
  }

  #[test]
  fn overrides_win_and_data_dir_is_created()
  {
    let temp =
      tempdir().expect("tempdir");
    let target =
      temp.path().join("nested/data");
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "data.location".to_string(),
      target.display().to_string()
    )]);

    let dir =
      resolve_data_dir(&cfg, None)
        .expect("data dir");
    assert_eq!(dir, target);
    assert!(dir.is_dir());
  }

  #[test]
  fn rejects_unknown_boolean() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "color".to_string(),
      "maybe".to_string()
    )]);
    assert!(
      cfg.get_bool("color").is_err()
    );
  }
}
