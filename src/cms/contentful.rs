use super::{CmsError, CmsResult};
use crate::config::Config;
use crate::utils::text_utils::bounded_prefix;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

// REST backend in the Contentful style. Entries
// live under a space and environment and get
// filtered through fields.* query parameters,
// with linked assets riding along in a separate
// includes section of the response.
pub struct ContentfulSource {
  client: reqwest::Client,
  api_base: String,
  space_id: String,
  access_token: String,
  environment: String,
  news_content_type: String,
  gallery_content_type: String,
  locale: String,
  include_depth: u32
}

impl ContentfulSource {

  // None when the credentials are missing, the
  // caller decides what that means for the app.
  pub fn from_config(config: &Config) -> Option<Self> {
    let space_id = nonempty_option(&config.contentful_space_id)?;
    let access_token = nonempty_option(&config.contentful_access_token)?;
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .expect("Could not build the Contentful HTTP client");
    Some(Self {
      client,
      api_base: config.contentful_api_base.clone(),
      space_id,
      access_token,
      environment: config.contentful_environment.clone(),
      news_content_type: config.contentful_news_content_type.clone(),
      gallery_content_type: config.contentful_gallery_content_type.clone(),
      locale: config.contentful_locale.clone(),
      include_depth: config.contentful_include_depth
    })
  }

  pub async fn news_posts(&self) -> CmsResult<Vec<Value>> {
    self
      .entries(&self.news_content_type, "-fields.publicationDate", None)
      .await
  }

  pub async fn news_post_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    let mut items = self
      .entries(&self.news_content_type, "-fields.publicationDate", Some(slug))
      .await?;
    Ok(if items.is_empty() {
      None
    } else {
      Some(items.remove(0))
    })
  }

  pub async fn gallery_albums(&self) -> CmsResult<Vec<Value>> {
    self
      .entries(&self.gallery_content_type, "-fields.date", None)
      .await
  }

  pub async fn gallery_album_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    let mut items = self
      .entries(&self.gallery_content_type, "-fields.date", Some(slug))
      .await?;
    Ok(if items.is_empty() {
      None
    } else {
      Some(items.remove(0))
    })
  }

  fn entries_url(&self) -> String {
    format!(
      "{}/spaces/{}/environments/{}/entries",
      self.api_base, self.space_id, self.environment
    )
  }

  // One generic entries query, the four public
  // methods are thin wrappers around it. Only
  // published records ever leave the CMS.
  async fn entries(
    &self,
    content_type: &str,
    order: &str,
    slug: Option<&str>
  ) -> CmsResult<Vec<Value>> {
    let include = self.include_depth.to_string();
    let mut params: Vec<(&str, &str)> = vec![
      ("content_type", content_type),
      ("fields.published", "true"),
      ("order", order),
      ("locale", &self.locale),
      ("include", &include)
    ];
    if let Some(slug) = slug {
      params.push(("fields.slug", slug));
      params.push(("limit", "1"));
    }
    debug!("Contentful query for {} entries", content_type);
    let response = self
      .client
      .get(&self.entries_url())
      .bearer_auth(&self.access_token)
      .query(&params)
      .send()
      .await?;
    let status = response.status();
    // Text first, a failing status often comes with
    // a JSON body worth logging:
    let body = response.text().await?;
    if !status.is_success() {
      return Err(CmsError::Transport(format!(
        "HTTP {} - {}",
        status.as_u16(),
        bounded_prefix(&body, 200)
      )));
    }
    let payload: Value =
      serde_json::from_str(&body).map_err(|e| CmsError::BadResponse(e.to_string()))?;
    let assets = asset_index(&payload);
    let items = match payload["items"].as_array() {
      Some(items) => items,
      None => return Err(CmsError::BadResponse(String::from("no items array")))
    };
    Ok(
      items
        .iter()
        .map(|item| normalize_entry(item, &assets))
        .collect()
    )
  }

}

fn nonempty_option(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(String::from)
}

// Assets arrive separately from the entries that
// reference them, indexed here by sys.id so link
// resolution is a lookup.
fn asset_index(payload: &Value) -> HashMap<String, Value> {
  let mut index = HashMap::new();
  if let Some(assets) = payload["includes"]["Asset"].as_array() {
    for asset in assets {
      if let Some(id) = asset["sys"]["id"].as_str() {
        index.insert(id.to_string(), asset.clone());
      }
    }
  }
  index
}

// The raw record the mapper consumes: the entry
// fields with asset links resolved and the sys id
// folded in as a plain id field.
fn normalize_entry(item: &Value, assets: &HashMap<String, Value>) -> Value {
  let id = item["sys"]["id"].as_str().unwrap_or("");
  let mut record = resolve_links(&item["fields"], assets);
  match record.as_object_mut() {
    Some(map) => {
      map.insert(String::from("id"), Value::String(id.to_string()));
      record
    }
    // An entry without fields still yields a record,
    // the mapper fills in the blanks:
    None => json!({ "id": id })
  }
}

fn resolve_links(value: &Value, assets: &HashMap<String, Value>) -> Value {
  match value {
    Value::Object(map) => {
      if let Some(id) = asset_link_id(value) {
        return match assets.get(id) {
          Some(asset) => asset.clone(),
          // Link to an asset the response didn't
          // include, kept as is and later dropped by
          // the image resolution:
          None => value.clone()
        };
      }
      Value::Object(
        map
          .iter()
          .map(|(key, entry)| (key.clone(), resolve_links(entry, assets)))
          .collect()
      )
    }
    Value::Array(items) => Value::Array(
      items
        .iter()
        .map(|item| resolve_links(item, assets))
        .collect()
    ),
    other => other.clone()
  }
}

fn asset_link_id(value: &Value) -> Option<&str> {
  let sys = value.get("sys")?;
  if sys["type"] == "Link" && sys["linkType"] == "Asset" {
    sys["id"].as_str()
  } else {
    None
  }
}
