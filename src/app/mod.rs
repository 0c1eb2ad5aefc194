use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use color_eyre::Result;
use eyre::WrapErr;
use log::{debug, error, info, warn};
use rate_limiter::BasicRateLimiter;
use std::sync::RwLock;
// I think we have to add crate here because
// of the other crate named "config" that we
// use as a dependency.
use crate::cms::ContentSource;
use crate::config::Config;
use crate::translate::Translator;
mod handlers;
mod dtos;
mod error;
mod rate_limiter;

// Declare app state struct:
pub struct AppState {
  pub content: ContentSource,
  pub translator: Translator,
  pub rate_limiter: RwLock<BasicRateLimiter>
}

// This shouldn't be that weird I'm sorry. These functions
// could be moved elsewhere to not be directly in AppState.
impl AppState {

  pub fn check_rate_limit(&self) -> bool {
    let (needs_update, is_locked) = self.rate_limiter_needs_update();
    if needs_update {
      // Get a lock on the rate limiter:
      match self.rate_limiter.write() {
        Ok(mut rl) => return rl.update(),
        Err(e) => {
          error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        }
      }
    }
    return is_locked
  }

  // Returns tuple: "needs update" first, then the current
  // is_locked value.
  fn rate_limiter_needs_update(&self) -> (bool, bool) {
    match self.rate_limiter.read() {
      Ok(rl) => (
        !rl.is_locked() || (rl.is_locked() && rl.is_expired()),
        rl.is_locked()
      ),
      Err(e) => {
        // I decided to ignore possible weird rate limiter lock
        // errors which should never happen.
        error!("Could not get a read handle on the rate limiter - \
          SHOULD NEVER HAPPEN - {}", e);
        (false, false)
      }
    }
  }

}

// Function to start the server.
// Has to be async because there should be a .await at the end.
pub async fn run() -> Result<()> {
  let config = Config::from_env()
    .expect("Configuration (environment or .env file) is missing");
  debug!("Current config: {:?}", config);

  let content = ContentSource::from_config(&config);
  match &content {
    ContentSource::Unavailable(which) => warn!(
      "{} credentials are missing, content endpoints will answer with errors",
      which
    ),
    other => info!("Using the {} content backend", other.name())
  }

  let translator = Translator::from_config(&config);
  if !translator.is_configured() {
    warn!("No translation endpoints configured, missing English text \
      will fall back to Romanian");
  }

  // Got to save the bind_address for later because
  // we'll be destroying "config" by moving parts of
  // it into app_state.
  let bind_address = config.bind_address.clone();

  let app_state = web::Data::new(
    AppState {
      content,
      translator,
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration
        )
      )
    }
  );

  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .app_data(web::PathConfig::default().error_handler(|_, _| {
        // Parse failures answer in JSON like every
        // other error here:
        error::Error::BadRequest(String::from("Invalid path arguments")).into()
      }))
      .app_data(web::QueryConfig::default().error_handler(|_, _| {
        error::Error::BadRequest(String::from("Invalid query string arguments")).into()
      }))
      .app_data(web::JsonConfig::default().error_handler(|_, _| {
        error::Error::BadRequest(String::from("Invalid JSON body")).into()
      }))
      .wrap(permissive_cors())
      .wrap(middleware::Logger::default())
      .configure(base_endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")

}

// The browser talks to these endpoints from any
// origin, same allowances the old API sent:
fn permissive_cors() -> Cors {
  Cors::default()
    .allow_any_origin()
    .send_wildcard()
    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
    .allowed_headers(vec![
      "authorization",
      "x-client-info",
      "apikey",
      "content-type"
    ])
}

// Route configuration:
fn base_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.route("/", web::get().to(handlers::index))
    .route("/api/news", web::get().to(handlers::news_posts))
    .route("/api/news/{slug}", web::get().to(handlers::news_post_by_slug))
    .route("/api/gallery", web::get().to(handlers::gallery_albums))
    .route("/api/gallery/{slug}", web::get().to(handlers::gallery_album_by_slug))
    // The translation endpoint answers 405 to other
    // methods instead of falling through to the 404:
    .service(
      web::resource("/api/translate")
        .route(web::post().to(handlers::translate))
        .route(web::route().to(handlers::method_not_allowed))
    );
}
