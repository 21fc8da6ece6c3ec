/* crates/quilt-server/src/errors.rs */

use std::fmt;

/// Wire-level error carried through the assembly pipeline and surfaced to
/// HTTP adapters. The status is the HTTP-equivalent code a routed data
/// source execution would answer with.
#[derive(Debug, Clone)]
pub struct QuiltError {
  code: String,
  message: String,
  status: u16,
}

fn default_status(code: &str) -> u16 {
  match code {
    "VALIDATION_ERROR" => 400,
    "UNAUTHORIZED" => 401,
    "FORBIDDEN" => 403,
    "NOT_FOUND" => 404,
    "TIMEOUT" => 504,
    "RATE_LIMITED" => 429,
    "INTERNAL_ERROR" => 500,
    _ => 500,
  }
}

impl QuiltError {
  pub fn new(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
    Self { code: code.into(), message: message.into(), status }
  }

  pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
    let code = code.into();
    let status = default_status(&code);
    Self { code, message: message.into(), status }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::with_code("VALIDATION_ERROR", msg)
  }

  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::with_code("NOT_FOUND", msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::with_code("INTERNAL_ERROR", msg)
  }

  pub fn unauthorized(msg: impl Into<String>) -> Self {
    Self::with_code("UNAUTHORIZED", msg)
  }

  pub fn forbidden(msg: impl Into<String>) -> Self {
    Self::with_code("FORBIDDEN", msg)
  }

  pub fn timeout(msg: impl Into<String>) -> Self {
    Self::with_code("TIMEOUT", msg)
  }

  pub fn rate_limited(msg: impl Into<String>) -> Self {
    Self::with_code("RATE_LIMITED", msg)
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn status(&self) -> u16 {
    self.status
  }
}

impl fmt::Display for QuiltError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code, self.message)
  }
}

impl std::error::Error for QuiltError {}
