use actix_web::{
  error::ResponseError,
  HttpResponse
};
use derive_more::Display;
use log::error;
use super::dtos::JsonError;
use crate::cms::CmsError;
use crate::translate::TranslateError;

// Not sure if it's a good idea to call it "Error"
// but uh... Yeah I don't know.
// The Display value is the public message, the full
// error output should only appear in logs. Variants
// carrying details that must not leak display a
// fixed text instead of _0.
#[derive(Debug, Display)]
pub enum Error {
  // Deliberately descriptive, the frontend shows
  // this one during setup:
  #[display(fmt = "{}", _0)]
  NotConfigured(String),
  #[display(fmt = "{}", _0)]
  UpstreamError(String),
  #[display(fmt = "Translation service error")]
  TranslationError(String),
  #[display(fmt = "{}", _0)]
  NotFound(String),
  #[display(fmt = "{}", _0)]
  BadRequest(String),
  #[display(fmt = "Method not allowed")]
  MethodNotAllowed,
  #[display(fmt = "Too many requests")]
  TooManyRequests
}

// The old API sent JSON error bodies and the
// frontend matches on some of the messages, so
// everything is {"error": "..."} here.
impl ResponseError for Error {
  fn error_response(&self) -> HttpResponse {
    let body = JsonError {
      error: self.to_string()
    };
    match self {
      Error::NotConfigured(_)
        | Error::UpstreamError(_) => HttpResponse::InternalServerError().json(body),
      Error::TranslationError(_) => HttpResponse::BadGateway().json(body),
      Error::NotFound(_) => HttpResponse::NotFound().json(body),
      Error::BadRequest(_) => HttpResponse::BadRequest().json(body),
      Error::MethodNotAllowed => HttpResponse::MethodNotAllowed().json(body),
      Error::TooManyRequests => HttpResponse::TooManyRequests().json(body)
    }
  }
}

// CMS errors keep their details out of the response.
// The public message is per endpoint, which is why
// this isn't a From impl.
pub fn map_cms_error(e: CmsError, public_message: &str) -> Error {
  match e {
    CmsError::NotConfigured(_) => Error::NotConfigured(e.to_string()),
    other => {
      error!("CMS request failed - {}", other);
      Error::UpstreamError(String::from(public_message))
    }
  }
}

impl From<TranslateError> for Error {
  fn from(e: TranslateError) -> Self {
    error!("Translation request failed - {}", e);
    Error::TranslationError(e.to_string())
  }
}
