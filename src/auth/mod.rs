//! User identity binding for request contexts.

/// Role token attached to a request once the engine's auth layer has
/// admitted it. Connections that never authenticated carry the
/// anonymous token: the empty role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  media_factory_role: String,
}

impl Token {

  pub fn new(media_factory_role: impl Into<String>) -> Self {
    Self {
      media_factory_role: media_factory_role.into(),
    }
  }

  /// The default token for unauthenticated connections.
  pub fn anonymous() -> Self {
    Self::new("")
  }

  pub fn media_factory_role(&self) -> &str {
    &self.media_factory_role
  }

}

/// Per-request context handed along by the engine with play and record
/// events. Disconnect events carry no context; the originating one may
/// no longer exist by the time they fire.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
  pub token: Option<Token>,
}

impl RequestContext {

  pub fn new(token: Token) -> Self {
    Self { token: Some(token) }
  }

  pub fn anonymous() -> Self {
    Self::default()
  }

  /// User identity for notification purposes: the token's role if one
  /// is present, else the empty string (the anonymous role).
  pub fn user(&self) -> &str {
    self
      .token
      .as_ref()
      .map(Token::media_factory_role)
      .unwrap_or("")
  }

}
