use std::path::Path;

use serde::Deserialize;

use config::{
  Config,
  ConfigError,
  Environment,
  File,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Port of the static test-pattern server.
  pub static_port: u16,
  /// Port of the restream server.
  pub restream_port: u16,
  /// Serve the restream port over TLS.
  pub use_tls: bool,
  /// Cap on distinct live paths; 0 disables the limit.
  pub max_paths_count: u32,
  /// Cap on concurrent clients per path; 0 disables the limit.
  pub max_clients_per_path: u32,
}

impl Default for AppConfig {

  fn default() -> Self {
    Self {
      static_port: 8010,
      restream_port: 8554,
      use_tls: false,
      max_paths_count: 0,
      max_clients_per_path: 0,
    }
  }

}

impl AppConfig {

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path))
      .add_source(Environment::with_prefix("restream"))
      .build()?
      .try_deserialize()
  }

  /// Placeholder stream for paths that have no publisher yet.
  pub fn fallback_url(&self) -> String {
    format!("rtsp://localhost:{}/blue", self.static_port)
  }

}

#[cfg(test)]
mod tests {

  use super::*;

  #[test]
  fn limits_are_disabled_by_default() {
    let config = AppConfig::default();
    assert_eq!(config.max_paths_count, 0);
    assert_eq!(config.max_clients_per_path, 0);
    assert!(!config.use_tls);
  }

  #[test]
  fn fallback_points_at_the_static_blue_screen() {
    let config = AppConfig {
      static_port: 9000,
      ..Default::default()
    };
    assert_eq!(config.fallback_url(), "rtsp://localhost:9000/blue");
  }

}
