use actix_web::{
  web,
  HttpResponse,
  Result
};
use futures::future::join_all;
use super::dtos::*;
use super::error::{Error, map_cms_error};
use super::AppState;
use crate::content::{mapper, Lang};
use crate::translate::DEFAULT_SOURCE_LANG;

// Module with all the API handler functions.

// Public messages for when a backend call blows up.
// The real error only goes to the logs:
const NEWS_FETCH_FAILED: &'static str = "Failed to fetch news posts";
const GALLERY_FETCH_FAILED: &'static str = "Failed to fetch gallery albums";

pub async fn index() -> HttpResponse {
  HttpResponse::Ok().body("Nothing here")
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}

pub async fn method_not_allowed() -> Result<HttpResponse, Error> {
  Err(Error::MethodNotAllowed)
}

// I'm using the Result from actix_web for this.
// Let's use Result everywhere to be consistent,
// see my "error" module for the Error to response
// conversions.
pub async fn news_posts(
  app_state: web::Data<AppState>,
  query: web::Query<LangQuery>
) -> Result<HttpResponse, Error> {
  let lang = Lang::from_query(query.lang.as_deref());
  let items = app_state
    .content
    .news_posts()
    .await
    .map_err(|e| map_cms_error(e, NEWS_FETCH_FAILED))?;
  // Map everything concurrently, mapping English
  // output may call out to the translation service:
  let mut posts = join_all(
    items
      .iter()
      .map(|item| mapper::map_news_post(item, lang, &app_state.translator))
  )
  .await;
  // The backends already sort but not all of their
  // query paths can, so it's asserted again here:
  mapper::sort_news_newest_first(&mut posts);
  Ok(HttpResponse::Ok().json(posts))
}

// Path variables have to be in a tuple.
pub async fn news_post_by_slug(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>,
  query: web::Query<LangQuery>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let lang = Lang::from_query(query.lang.as_deref());
  let item = app_state
    .content
    .news_post_by_slug(&slug)
    .await
    .map_err(|e| map_cms_error(e, NEWS_FETCH_FAILED))?;
  match item {
    Some(item) => {
      let post = mapper::map_news_post(&item, lang, &app_state.translator).await;
      Ok(HttpResponse::Ok().json(post))
    }
    None => Err(Error::NotFound(String::from("Post not found")))
  }
}

pub async fn gallery_albums(
  app_state: web::Data<AppState>,
  query: web::Query<LangQuery>
) -> Result<HttpResponse, Error> {
  let lang = Lang::from_query(query.lang.as_deref());
  let items = app_state
    .content
    .gallery_albums()
    .await
    .map_err(|e| map_cms_error(e, GALLERY_FETCH_FAILED))?;
  let mut albums = join_all(
    items
      .iter()
      .map(|item| mapper::map_gallery_album(item, lang, &app_state.translator))
  )
  .await;
  mapper::sort_albums_newest_first(&mut albums);
  Ok(HttpResponse::Ok().json(albums))
}

pub async fn gallery_album_by_slug(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>,
  query: web::Query<LangQuery>
) -> Result<HttpResponse, Error> {
  let slug = path.into_inner().0;
  let lang = Lang::from_query(query.lang.as_deref());
  let item = app_state
    .content
    .gallery_album_by_slug(&slug)
    .await
    .map_err(|e| map_cms_error(e, GALLERY_FETCH_FAILED))?;
  match item {
    Some(item) => {
      let album = mapper::map_gallery_album(&item, lang, &app_state.translator).await;
      Ok(HttpResponse::Ok().json(album))
    }
    None => Err(Error::NotFound(String::from("Album not found")))
  }
}

pub async fn translate(
  app_state: web::Data<AppState>,
  body: web::Json<TranslateBody>
) -> Result<HttpResponse, Error> {
  let (text, target) = match (body.query_text(), body.target_lang()) {
    (Some(text), Some(target)) => (text, target),
    _ => {
      return Err(Error::BadRequest(String::from(
        "Missing required parameters"
      )))
    }
  };
  let source = body.source_lang().unwrap_or(DEFAULT_SOURCE_LANG);
  // This is where I decide to check with my really
  // basic homemade rate limiter:
  if app_state.check_rate_limit() {
    return Err(Error::TooManyRequests);
  }
  let translated = app_state
    .translator
    .translate_cached(text, source, target)
    .await?;
  Ok(HttpResponse::Ok().json(TranslateResponse {
    translated_text: translated
  }))
}
