use std::fmt;

use crate::session::StreamPathRef;

pub type FirstPlayerConnected = Box<dyn Fn(&str, &StreamPathRef) + Send + Sync>;
pub type LastPlayerDisconnected = Box<dyn Fn(&StreamPathRef) + Send + Sync>;
pub type RecorderConnected = Box<dyn Fn(&str, &StreamPathRef) + Send + Sync>;
pub type RecorderDisconnected = Box<dyn Fn(&StreamPathRef) + Send + Sync>;

/// Transition notifications the coordinator reports to the host. Any
/// subset may be unset; unset callbacks are skipped.
///
/// Connect notifications carry the authenticated user and the path;
/// disconnect notifications carry only the path, because by the time
/// they fire the originating request context may be gone.
///
/// Callbacks run with the coordinator's state lock held: they must not
/// block and must not call back into the coordinator.
#[derive(Default)]
pub struct Callbacks {
  pub first_player_connected: Option<FirstPlayerConnected>,
  pub last_player_disconnected: Option<LastPlayerDisconnected>,
  pub recorder_connected: Option<RecorderConnected>,
  pub recorder_disconnected: Option<RecorderDisconnected>,
}

/// What a client is trying to do with a path, as presented to the
/// host's `authorize` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Access,
  Play,
  Record,
}

impl fmt::Display for Action {

  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Action::Access => write!(f, "access"),
      Action::Play => write!(f, "play"),
      Action::Record => write!(f, "record"),
    }
  }

}

pub type TlsAuthenticate = Box<dyn Fn(&[u8]) -> Option<String> + Send + Sync>;
pub type AuthenticationRequired = Box<dyn Fn(&StreamPathRef, &str) -> bool + Send + Sync>;
pub type Authenticate = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;
pub type Authorize = Box<dyn Fn(&str, Action, &StreamPathRef, bool) -> bool + Send + Sync>;

/// Authentication and authorization policy injected by the host and
/// consumed by the engine's auth layer.
///
/// `tls_authenticate` maps a peer certificate (DER) to a user id.
/// `authentication_required` gates anonymous access per path and
/// method. `authenticate` checks credentials. `authorize` decides
/// whether `user` may perform `action` on `path` (`record` flags a
/// publishing request).
#[derive(Default)]
pub struct AuthCallbacks {
  pub tls_authenticate: Option<TlsAuthenticate>,
  pub authentication_required: Option<AuthenticationRequired>,
  pub authenticate: Option<Authenticate>,
  pub authorize: Option<Authorize>,
}

impl AuthCallbacks {

  /// Access check in the shape the engine's mount table wants it:
  /// `authorize` bound to [`Action::Access`]. Grants when no
  /// `authorize` callback is installed.
  pub fn authorize_access(&self, user: &str, path: &StreamPathRef, record: bool) -> bool {
    match &self.authorize {
      Some(authorize) => authorize(user, Action::Access, path, record),
      None => true,
    }
  }

}
