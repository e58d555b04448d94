use std::collections::{HashMap, HashSet};

use crate::session::{ClientId, SessionId, StreamPath, StreamPathRef};

/// Per-connection bookkeeping: every path this client currently touches
/// in any role.
#[derive(Debug, Default)]
pub struct ClientState {
  pub ref_paths: HashSet<StreamPath>,
}

/// Per-path bookkeeping.
///
/// `play_count` counts active play sessions, not distinct players. The
/// recorder, when set, is always a member of `ref_clients`, and
/// `record_client` and `record_session_id` are set and cleared
/// together.
#[derive(Debug)]
pub struct PathState {
  pub ref_clients: HashSet<ClientId>,
  pub play_count: u32,
  pub record_client: Option<ClientId>,
  pub record_session_id: Option<SessionId>,
}

/// The two sides of the client↔path graph, kept in lockstep.
///
/// Pure state: no admission policy and no notifications here. All
/// mutation happens inside the coordinator's event handlers, under its
/// lock.
#[derive(Debug, Default)]
pub struct StateStore {
  clients: HashMap<ClientId, ClientState>,
  paths: HashMap<StreamPath, PathState>,
}

impl StateStore {

  pub fn new() -> Self {
    Self::default()
  }

  /// Make `client` reference `path`, creating either entry if missing.
  /// Never touches role counters.
  pub fn register(&mut self, client: ClientId, path: &StreamPathRef) -> &mut PathState {
    self
      .clients
      .entry(client)
      .or_default()
      .ref_paths
      .insert(path.to_string());

    let path_state = self
      .paths
      .entry(path.to_string())
      .or_insert_with(|| PathState {
        ref_clients: HashSet::new(),
        play_count: 0,
        record_client: None,
        record_session_id: None,
      });
    path_state.ref_clients.insert(client);
    path_state
  }

  /// Drop a path entry. The caller must have drained `ref_clients` and
  /// the role counters first.
  pub fn remove_path(&mut self, path: &StreamPathRef) {
    self.paths.remove(path);
  }

  /// Erase the client entry, handing its path references back to the
  /// caller for processing.
  pub fn remove_client(&mut self, client: ClientId) -> Option<ClientState> {
    self.clients.remove(&client)
  }

  pub fn is_recording(&self, path: &StreamPathRef) -> bool {
    match self.paths.get(path) {
      Some(path_state) => {
        path_state.record_client.is_some() || path_state.record_session_id.is_some()
      },
      None => false,
    }
  }

  pub fn client(&self, client: ClientId) -> Option<&ClientState> {
    self.clients.get(&client)
  }

  pub fn path(&self, path: &StreamPathRef) -> Option<&PathState> {
    self.paths.get(path)
  }

  pub fn path_mut(&mut self, path: &StreamPathRef) -> Option<&mut PathState> {
    self.paths.get_mut(path)
  }

  pub fn path_count(&self) -> usize {
    self.paths.len()
  }

}
