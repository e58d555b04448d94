use std::error;
use std::fmt;

use crate::session::state::StateStore;
use crate::session::StreamPathRef;

/// Stateless admission checks against the configured limits. A limit of
/// zero disables the corresponding check. All state comes from the
/// store snapshot the caller holds a lock on.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionPolicy {
  max_paths_count: u32,
  max_clients_per_path: u32,
}

impl AdmissionPolicy {

  pub fn new(max_paths_count: u32, max_clients_per_path: u32) -> Self {
    Self {
      max_paths_count,
      max_clients_per_path,
    }
  }

  /// Gate for PLAY. Runs before the play count is incremented: the
  /// candidate counts towards the limit too, so the existing count must
  /// stay strictly below `max_clients_per_path - 1`.
  pub fn check_play(
    &self,
    state: &StateStore,
    path: &StreamPathRef,
  ) -> Result<(), AdmissionError> {
    if self.max_clients_per_path > 0 {
      if let Some(path_state) = state.path(path) {
        if path_state.play_count >= self.max_clients_per_path - 1 {
          return Err(AdmissionError::PlayerLimitReached);
        }
      }
    }

    Ok(())
  }

  /// Gate for RECORD: one recorder per path.
  pub fn check_record(
    &self,
    state: &StateStore,
    path: &StreamPathRef,
  ) -> Result<(), AdmissionError> {
    if state.is_recording(path) {
      Err(AdmissionError::RecorderPresent)
    } else {
      Ok(())
    }
  }

  /// Gate for mounting a path that does not exist yet.
  pub fn check_new_path(
    &self,
    state: &StateStore,
    path: &StreamPathRef,
  ) -> Result<(), AdmissionError> {
    if self.max_paths_count > 0
      && state.path_count() >= self.max_paths_count as usize
      && state.path(path).is_none()
    {
      return Err(AdmissionError::PathLimitReached);
    }

    Ok(())
  }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
  PlayerLimitReached,
  RecorderPresent,
  PathLimitReached,
}

impl AdmissionError {

  /// RTSP status code the engine surfaces to the requesting client.
  pub fn status_code(&self) -> u16 {
    match self {
      AdmissionError::PlayerLimitReached => 403,
      AdmissionError::RecorderPresent => 503,
      AdmissionError::PathLimitReached => 503,
    }
  }

}

impl fmt::Display for AdmissionError {

  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      AdmissionError::PlayerLimitReached => write!(f, "max players count limit reached"),
      AdmissionError::RecorderPresent => write!(f, "another recorder is active on the same path"),
      AdmissionError::PathLimitReached => write!(f, "max paths count limit reached"),
    }
  }

}

impl error::Error for AdmissionError {}
