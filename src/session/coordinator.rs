use std::sync::Mutex;

use crate::auth::RequestContext;
use crate::hooks::Callbacks;
use crate::session::admission::{AdmissionError, AdmissionPolicy};
use crate::session::state::StateStore;
use crate::session::{ClientId, SessionIdRef, StreamPathRef};

/// Tracks which clients hold which roles on which paths and reports
/// population transitions through the installed callbacks.
///
/// Every handler performs its whole read-decide-mutate-emit cycle under
/// the state lock, so observers see transitions serialized in the
/// engine's dispatch order and each transition is reported exactly
/// once. Callbacks run under that lock; see [`Callbacks`] for the
/// re-entrancy contract.
pub struct SessionCoordinator {
  state: Mutex<StateStore>,
  admission: AdmissionPolicy,
  callbacks: Callbacks,
}

impl SessionCoordinator {

  pub fn new(admission: AdmissionPolicy, callbacks: Callbacks) -> Self {
    Self {
      state: Mutex::new(StateStore::new()),
      admission,
      callbacks,
    }
  }

  /// A connection was accepted. State entries are created lazily on the
  /// first play or record, so this only logs.
  pub fn on_client_connected(&self, client: ClientId) {
    tracing::info!(%client, "new connection");
  }

  /// Admission check for PLAY, before the engine commits the session.
  pub fn pre_play(
    &self,
    client: ClientId,
    path: &StreamPathRef,
    session_id: &SessionIdRef,
  ) -> Result<(), AdmissionError> {
    tracing::debug!(%client, path, session_id, "pre play");

    let state = self.state.lock().unwrap();
    match self.admission.check_play(&state, path) {
      Ok(()) => Ok(()),
      Err(err) => {
        tracing::error!(%client, path, session_id, %err, "play refused");
        Err(err)
      },
    }
  }

  /// Admission check for the engine's mount table: may `path` come
  /// into existence at all.
  pub fn check_new_path(&self, path: &StreamPathRef) -> Result<(), AdmissionError> {
    let state = self.state.lock().unwrap();
    self.admission.check_new_path(&state, path)
  }

  /// A play session went live on `path`.
  pub fn on_play(
    &self,
    client: ClientId,
    path: &StreamPathRef,
    session_id: &SessionIdRef,
    ctx: &RequestContext,
  ) {
    tracing::debug!(%client, path, session_id, "play");

    let mut state = self.state.lock().unwrap();
    let path_state = state.register(client, path);
    path_state.play_count += 1;
    if path_state.play_count == 1 {
      self.first_player_connected(ctx, path);
    }
  }

  /// Admission check for RECORD, before the engine commits the session.
  pub fn pre_record(
    &self,
    client: ClientId,
    path: &StreamPathRef,
    session_id: &SessionIdRef,
  ) -> Result<(), AdmissionError> {
    tracing::debug!(%client, path, session_id, "pre record");

    let state = self.state.lock().unwrap();
    match self.admission.check_record(&state, path) {
      Ok(()) => Ok(()),
      Err(err) => {
        tracing::info!(%client, path, session_id, %err, "record refused");
        Err(err)
      },
    }
  }

  /// A record session went live on `path`.
  pub fn on_record(
    &self,
    client: ClientId,
    path: &StreamPathRef,
    session_id: &SessionIdRef,
    ctx: &RequestContext,
  ) {
    tracing::debug!(%client, path, session_id, "record");

    let mut state = self.state.lock().unwrap();
    let path_state = state.register(client, path);
    if path_state.record_client.is_some() || path_state.record_session_id.is_some() {
      // A concurrent record slipped past the pre-check, or the engine
      // misbehaved. Keep the original recorder.
      tracing::error!(%client, path, "second record on the same path");
    } else {
      path_state.record_client = Some(client);
      path_state.record_session_id = Some(session_id.to_string());
      self.recorder_connected(ctx, path);
    }
  }

  /// A session on `path` was torn down by the client. The client↔path
  /// reference stays in place until the connection closes, so a request
  /// still in flight on the same connection cannot race the cleanup.
  pub fn on_teardown(
    &self,
    client: ClientId,
    path: &StreamPathRef,
    session_id: &SessionIdRef,
  ) {
    tracing::debug!(%client, path, session_id, "teardown");

    let mut state = self.state.lock().unwrap();
    let path_state = match state.path_mut(path) {
      Some(path_state) => path_state,
      None => {
        tracing::error!(%client, path, "teardown for a path that is not registered");
        return;
      },
    };

    if path_state.record_client == Some(client)
      && path_state.record_session_id.as_deref() == Some(session_id)
    {
      path_state.record_client = None;
      path_state.record_session_id = None;
      self.recorder_disconnected(path);
    } else if path_state.play_count > 0 {
      // Play sessions are tracked by count only, not by session id.
      path_state.play_count -= 1;
      if path_state.play_count == 0 {
        self.last_player_disconnected(path);
      }
    } else {
      tracing::error!(%client, path, "teardown without a matching play or record session");
    }
  }

  /// The transport connection went away, with or without preceding
  /// teardowns. Drains every role the client still holds and drops the
  /// path entries it was the last reference to.
  pub fn on_client_closed(&self, client: ClientId) {
    tracing::debug!(%client, "connection closed");

    let mut state = self.state.lock().unwrap();
    let client_state = match state.remove_client(client) {
      Some(client_state) => client_state,
      None => return,
    };

    for path in client_state.ref_paths {
      let path_state = match state.path_mut(&path) {
        Some(path_state) => path_state,
        None => {
          tracing::error!(%client, %path, "client refers to a path that is not registered");
          continue;
        },
      };

      path_state.ref_clients.remove(&client);

      if path_state.ref_clients.is_empty() {
        match path_state.record_client {
          None => {
            // The departing client was the only remaining reference,
            // so at most its own play session is left on the count.
            debug_assert!(path_state.play_count <= 1);
            if path_state.play_count == 1 {
              path_state.play_count -= 1;
              self.last_player_disconnected(&path);
            }
          },
          Some(record_client) => {
            debug_assert_eq!(record_client, client);
            path_state.record_client = None;
            path_state.record_session_id = None;
            self.recorder_disconnected(&path);
          },
        }

        state.remove_path(&path);
      } else {
        if path_state.record_client == Some(client) {
          path_state.record_client = None;
          path_state.record_session_id = None;
          self.recorder_disconnected(&path);
        }

        // One reference left with a recorder still set: the remaining
        // client is that recorder, and a leftover play session of its
        // own may keep the count at one.
        if path_state.ref_clients.len() == 1
          && path_state.record_client.is_some()
          && path_state.play_count == 1
        {
          path_state.play_count -= 1;
          self.last_player_disconnected(&path);
        }
      }
    }
  }

  fn first_player_connected(&self, ctx: &RequestContext, path: &StreamPathRef) {
    tracing::debug!(path, "first player connected");

    if let Some(callback) = &self.callbacks.first_player_connected {
      callback(ctx.user(), path);
    }
  }

  fn last_player_disconnected(&self, path: &StreamPathRef) {
    tracing::debug!(path, "last player disconnected");

    if let Some(callback) = &self.callbacks.last_player_disconnected {
      callback(path);
    }
  }

  fn recorder_connected(&self, ctx: &RequestContext, path: &StreamPathRef) {
    tracing::debug!(path, "recorder connected");

    if let Some(callback) = &self.callbacks.recorder_connected {
      callback(ctx.user(), path);
    }
  }

  fn recorder_disconnected(&self, path: &StreamPathRef) {
    tracing::debug!(path, "recorder disconnected");

    if let Some(callback) = &self.callbacks.recorder_disconnected {
      callback(path);
    }
  }

}
