use crate::config::Config;
use derive_more::Display;
use log::warn;
use serde_json::Value;

pub mod contentful;
pub mod sanity;

use contentful::ContentfulSource;
use sanity::SanitySource;

pub type CmsResult<T> = Result<T, CmsError>;

#[derive(Debug, Display)]
pub enum CmsError {
  // The wording ends up verbatim in the API error
  // body, the frontend matches on it:
  #[display(fmt = "{} credentials not configured", _0)]
  NotConfigured(&'static str),
  #[display(fmt = "request failed - {}", _0)]
  Transport(String),
  #[display(fmt = "unexpected response - {}", _0)]
  BadResponse(String)
}

impl std::error::Error for CmsError {}

impl From<reqwest::Error> for CmsError {
  fn from(e: reqwest::Error) -> Self {
    CmsError::Transport(e.to_string())
  }
}

// The one content backend the app talks to, picked
// at startup. Both real backends hand out the same
// normalized record shape so everything above this
// enum has no idea which CMS is behind it.
pub enum ContentSource {
  Contentful(ContentfulSource),
  Sanity(SanitySource),
  // Configured backend is missing its credentials.
  // The server still boots and serves errors, which
  // beats crashing on a missing env var in a
  // serverless-style deployment:
  Unavailable(&'static str),
  #[cfg(test)]
  Fixed(FixedSource)
}

impl ContentSource {

  pub fn from_config(config: &Config) -> Self {
    match config.cms_backend.as_str() {
      "sanity" => match SanitySource::from_config(config) {
        Some(source) => ContentSource::Sanity(source),
        None => ContentSource::Unavailable("Sanity")
      },
      other => {
        if other != "contentful" {
          warn!("Unknown CMS backend '{}', assuming contentful", other);
        }
        match ContentfulSource::from_config(config) {
          Some(source) => ContentSource::Contentful(source),
          None => ContentSource::Unavailable("Contentful")
        }
      }
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      ContentSource::Contentful(_) => "contentful",
      ContentSource::Sanity(_) => "sanity",
      ContentSource::Unavailable(_) => "unavailable",
      #[cfg(test)]
      ContentSource::Fixed(_) => "fixed"
    }
  }

  pub async fn news_posts(&self) -> CmsResult<Vec<Value>> {
    match self {
      ContentSource::Contentful(source) => source.news_posts().await,
      ContentSource::Sanity(source) => source.news_posts().await,
      ContentSource::Unavailable(which) => Err(CmsError::NotConfigured(which)),
      #[cfg(test)]
      ContentSource::Fixed(fixed) => Ok(fixed.news.clone())
    }
  }

  pub async fn news_post_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    match self {
      ContentSource::Contentful(source) => source.news_post_by_slug(slug).await,
      ContentSource::Sanity(source) => source.news_post_by_slug(slug).await,
      ContentSource::Unavailable(which) => Err(CmsError::NotConfigured(which)),
      #[cfg(test)]
      ContentSource::Fixed(fixed) => Ok(FixedSource::find_by_slug(&fixed.news, slug))
    }
  }

  pub async fn gallery_albums(&self) -> CmsResult<Vec<Value>> {
    match self {
      ContentSource::Contentful(source) => source.gallery_albums().await,
      ContentSource::Sanity(source) => source.gallery_albums().await,
      ContentSource::Unavailable(which) => Err(CmsError::NotConfigured(which)),
      #[cfg(test)]
      ContentSource::Fixed(fixed) => Ok(fixed.albums.clone())
    }
  }

  pub async fn gallery_album_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    match self {
      ContentSource::Contentful(source) => source.gallery_album_by_slug(slug).await,
      ContentSource::Sanity(source) => source.gallery_album_by_slug(slug).await,
      ContentSource::Unavailable(which) => Err(CmsError::NotConfigured(which)),
      #[cfg(test)]
      ContentSource::Fixed(fixed) => {
        Ok(FixedSource::find_by_slug(&fixed.albums, slug))
      }
    }
  }

}

// Canned records for handler tests, no network.
#[cfg(test)]
pub struct FixedSource {
  pub news: Vec<Value>,
  pub albums: Vec<Value>
}

#[cfg(test)]
impl FixedSource {
  fn find_by_slug(items: &[Value], slug: &str) -> Option<Value> {
    items
      .iter()
      .find(|item| item["slug"] == slug || item["slug"]["current"] == slug)
      .cloned()
  }
}
