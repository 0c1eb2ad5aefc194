use super::{CmsError, CmsResult};
use crate::config::Config;
use crate::content::rich_text::{
  Mark, RichTextDocument, RichTextNode, MARK_BOLD, MARK_CODE, MARK_ITALIC, MARK_UNDERLINE,
  NODE_BLOCKQUOTE, NODE_HEADING_2, NODE_HEADING_3, NODE_PARAGRAPH
};
use crate::utils::serde_utils::nonempty_str;
use crate::utils::text_utils::bounded_prefix;
use log::debug;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const FEATURED_IMAGE_WIDTH: u32 = 800;
const GALLERY_IMAGE_WIDTH: u32 = 1200;

// Drafts live under a separate id path and must
// never reach the site, published or not.
const DRAFTS_FILTER: &str = "!(_id in path(\"drafts.**\"))";

const NEWS_FIELDS: &str = "_id, titleRo, titleEn, slug, category, publicationDate, \
                           featuredImage, excerptRo, excerptEn, contentRo, contentEn, \
                           additionalImages, facebookLink, published";

const GALLERY_FIELDS: &str = "_id, titleRo, titleEn, slug, category, eventDate, \
                              coverImage, descriptionRo, descriptionEn, images, published";

// Query language backend in the Sanity style. The
// records come back in a different shape than the
// REST backend delivers, so everything gets
// normalized here into the same raw record the
// mapper consumes. Language variants are separate
// top level fields upstream, they are folded into
// locale keyed maps on the way out.
pub struct SanitySource {
  client: reqwest::Client,
  project_id: String,
  dataset: String,
  api_version: String,
  token: Option<String>,
  use_cdn: bool
}

impl SanitySource {

  pub fn from_config(config: &Config) -> Option<Self> {
    let project_id = nonempty_option(&config.sanity_project_id)?;
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .expect("Could not build the Sanity HTTP client");
    Some(Self {
      client,
      project_id,
      dataset: config.sanity_dataset.clone(),
      api_version: config.sanity_api_version.clone(),
      token: nonempty_option(&config.sanity_api_token),
      use_cdn: config.sanity_use_cdn
    })
  }

  pub async fn news_posts(&self) -> CmsResult<Vec<Value>> {
    let result = self.query(&news_list_query(), None).await?;
    match result.as_array() {
      Some(items) => Ok(items.iter().map(|item| self.normalize_news(item)).collect()),
      None => Err(CmsError::BadResponse(String::from("no result array")))
    }
  }

  pub async fn news_post_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    let result = self.query(&news_slug_query(), Some(slug)).await?;
    Ok(if result.is_null() {
      None
    } else {
      Some(self.normalize_news(&result))
    })
  }

  pub async fn gallery_albums(&self) -> CmsResult<Vec<Value>> {
    let result = self.query(&gallery_list_query(), None).await?;
    match result.as_array() {
      Some(items) => Ok(items.iter().map(|item| self.normalize_gallery(item)).collect()),
      None => Err(CmsError::BadResponse(String::from("no result array")))
    }
  }

  pub async fn gallery_album_by_slug(&self, slug: &str) -> CmsResult<Option<Value>> {
    let result = self.query(&gallery_slug_query(), Some(slug)).await?;
    Ok(if result.is_null() {
      None
    } else {
      Some(self.normalize_gallery(&result))
    })
  }

  fn query_url(&self) -> String {
    // The CDN host serves cached documents, the api
    // host always hits the live dataset:
    let host = if self.use_cdn {
      "apicdn.sanity.io"
    } else {
      "api.sanity.io"
    };
    format!(
      "https://{}.{}/v{}/data/query/{}",
      self.project_id, host, self.api_version, self.dataset
    )
  }

  async fn query(&self, groq: &str, slug: Option<&str>) -> CmsResult<Value> {
    let mut params: Vec<(&str, String)> = vec![("query", groq.to_string())];
    if let Some(slug) = slug {
      // Query parameters travel JSON encoded, a
      // string gets its quotes here:
      params.push(("$slug", Value::String(slug.to_string()).to_string()));
    }
    debug!("Sanity query against dataset {}", self.dataset);
    let mut request = self.client.get(&self.query_url()).query(&params);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      return Err(CmsError::Transport(format!(
        "HTTP {} - {}",
        status.as_u16(),
        bounded_prefix(&body, 200)
      )));
    }
    let mut payload: Value =
      serde_json::from_str(&body).map_err(|e| CmsError::BadResponse(e.to_string()))?;
    Ok(payload["result"].take())
  }

  fn normalize_news(&self, item: &Value) -> Value {
    json!({
      "id": item["_id"].as_str().unwrap_or(""),
      "title": locale_map(&item["titleRo"], &item["titleEn"]),
      "slug": item["slug"]["current"].as_str().unwrap_or(""),
      "category": item["category"].clone(),
      "publicationDate": item["publicationDate"].clone(),
      "featuredImage": self.image_url_value(&item["featuredImage"], FEATURED_IMAGE_WIDTH),
      "excerpt": locale_map(&item["excerptRo"], &item["excerptEn"]),
      "content": self.document_map(&item["contentRo"], &item["contentEn"]),
      "additionalImages": self.image_url_array(&item["additionalImages"], GALLERY_IMAGE_WIDTH),
      "facebookLink": item["facebookLink"].clone(),
      "published": item["published"].clone()
    })
  }

  fn normalize_gallery(&self, item: &Value) -> Value {
    json!({
      "id": item["_id"].as_str().unwrap_or(""),
      "albumTitle": locale_map(&item["titleRo"], &item["titleEn"]),
      "slug": item["slug"]["current"].as_str().unwrap_or(""),
      "category": item["category"].clone(),
      "date": item["eventDate"].clone(),
      "coverImage": self.image_url_value(&item["coverImage"], FEATURED_IMAGE_WIDTH),
      "description": locale_map(&item["descriptionRo"], &item["descriptionEn"]),
      "images": self.gallery_images(&item["images"]),
      "published": item["published"].clone()
    })
  }

  fn document_map(&self, ro: &Value, en: &Value) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(doc) = self.portable_text_to_document(ro) {
      map.insert(String::from("ro-RO"), doc);
    }
    if let Some(doc) = self.portable_text_to_document(en) {
      map.insert(String::from("en-GB"), doc);
    }
    if map.is_empty() {
      Value::Null
    } else {
      Value::Object(map)
    }
  }

  // The portable text block array becomes the rich
  // text tree the frontend renders. Only the block
  // and image types exist upstream, anything else
  // degrades to an empty paragraph.
  fn portable_text_to_document(&self, value: &Value) -> Option<Value> {
    let blocks = value.as_array()?;
    let content = blocks.iter().map(|block| self.convert_block(block)).collect();
    let document = RichTextDocument::new(content);
    if document.is_empty() {
      return None;
    }
    serde_json::to_value(&document).ok()
  }

  fn convert_block(&self, block: &Value) -> RichTextNode {
    match block["_type"].as_str() {
      Some("block") => {
        let node_type = match block["style"].as_str() {
          Some("h2") => NODE_HEADING_2,
          Some("h3") => NODE_HEADING_3,
          Some("blockquote") => NODE_BLOCKQUOTE,
          _ => NODE_PARAGRAPH
        };
        let content = match block["children"].as_array() {
          Some(children) => children.iter().map(convert_child).collect(),
          None => Vec::new()
        };
        RichTextNode::Block {
          node_type: node_type.to_string(),
          data: json!({}),
          content
        }
      }
      Some("image") => self.convert_image_block(block),
      _ => RichTextNode::Block {
        node_type: NODE_PARAGRAPH.to_string(),
        data: json!({}),
        content: vec![empty_text_node()]
      }
    }
  }

  // Inline images turn into the embedded asset
  // shape the REST backend would have delivered.
  fn convert_image_block(&self, block: &Value) -> RichTextNode {
    let url = self.image_url(block, None).unwrap_or_default();
    RichTextNode::EmbeddedAsset {
      data: json!({
        "target": {
          "fields": {
            "file": { "url": url },
            "title": block["alt"].as_str().unwrap_or(""),
            "description": block["caption"].as_str().unwrap_or("")
          }
        }
      })
    }
  }

  fn gallery_images(&self, value: &Value) -> Value {
    let images = match value.as_array() {
      Some(images) => images,
      None => return Value::Array(Vec::new())
    };
    Value::Array(
      images
        .iter()
        .filter_map(|image| {
          let url = self.image_url(image, Some(GALLERY_IMAGE_WIDTH))?;
          let mut entry = serde_json::Map::new();
          entry.insert(String::from("url"), Value::String(url));
          if let Some(alt) = nonempty_str(&image["alt"]) {
            entry.insert(String::from("alt"), Value::String(alt.to_string()));
          }
          if let Some(caption) = nonempty_str(&image["caption"]) {
            entry.insert(String::from("caption"), Value::String(caption.to_string()));
          }
          Some(Value::Object(entry))
        })
        .collect()
    )
  }

  fn image_url_array(&self, value: &Value, width: u32) -> Value {
    match value.as_array() {
      Some(images) => Value::Array(
        images
          .iter()
          .filter_map(|image| self.image_url(image, Some(width)))
          .map(Value::String)
          .collect()
      ),
      None => Value::Array(Vec::new())
    }
  }

  fn image_url_value(&self, image: &Value, width: u32) -> Value {
    match self.image_url(image, Some(width)) {
      Some(url) => Value::String(url),
      None => Value::Null
    }
  }

  // Image fields point at an asset document through
  // a reference like image-{id}-{width}x{height}-{ext}
  // that expands into a CDN URL. Dereferenced assets
  // with a plain url pass straight through.
  fn image_url(&self, image: &Value, width: Option<u32>) -> Option<String> {
    if let Some(url) = nonempty_str(&image["asset"]["url"]) {
      return Some(url.to_string());
    }
    let asset_ref = nonempty_str(&image["asset"]["_ref"])?;
    let trimmed = asset_ref.strip_prefix("image-")?;
    let mut parts = trimmed.rsplitn(3, '-');
    let extension = parts.next()?;
    let dimensions = parts.next()?;
    let id = parts.next()?;
    let base = format!(
      "https://cdn.sanity.io/images/{}/{}/{}-{}.{}",
      self.project_id, self.dataset, id, dimensions, extension
    );
    Some(match width {
      Some(width) => format!("{}?w={}", base, width),
      None => base
    })
  }

}

fn news_list_query() -> String {
  format!(
    "*[_type == \"newsPost\" && published == true && {}] \
     | order(publicationDate desc){{{}}}",
    DRAFTS_FILTER, NEWS_FIELDS
  )
}

fn news_slug_query() -> String {
  format!(
    "*[_type == \"newsPost\" && slug.current == $slug && published == true && {}]{{{}}}[0]",
    DRAFTS_FILTER, NEWS_FIELDS
  )
}

fn gallery_list_query() -> String {
  format!(
    "*[_type == \"galleryAlbum\" && published == true && {}] \
     | order(eventDate desc){{{}}}",
    DRAFTS_FILTER, GALLERY_FIELDS
  )
}

fn gallery_slug_query() -> String {
  format!(
    "*[_type == \"galleryAlbum\" && slug.current == $slug && published == true && {}]{{{}}}[0]",
    DRAFTS_FILTER, GALLERY_FIELDS
  )
}

fn nonempty_option(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(String::from)
}

// Fold the two language fields into one locale
// keyed map, leaving out languages with nothing to
// say so the fallback picking works the same as
// for the REST backend.
fn locale_map(ro: &Value, en: &Value) -> Value {
  let mut map = serde_json::Map::new();
  if let Some(text) = nonempty_str(ro) {
    map.insert(String::from("ro-RO"), Value::String(text.to_string()));
  }
  if let Some(text) = nonempty_str(en) {
    map.insert(String::from("en-GB"), Value::String(text.to_string()));
  }
  if map.is_empty() {
    Value::Null
  } else {
    Value::Object(map)
  }
}

fn convert_child(child: &Value) -> RichTextNode {
  if child["_type"] != "span" {
    return empty_text_node();
  }
  let marks = match child["marks"].as_array() {
    Some(marks) => marks
      .iter()
      .filter_map(Value::as_str)
      .map(convert_mark)
      .collect(),
    None => Vec::new()
  };
  RichTextNode::Text {
    value: child["text"].as_str().unwrap_or("").to_string(),
    marks,
    data: json!({})
  }
}

// Decorator names differ between the two formats,
// unknown ones ride along unchanged.
fn convert_mark(mark: &str) -> Mark {
  match mark {
    "strong" => Mark::new(MARK_BOLD),
    "em" => Mark::new(MARK_ITALIC),
    "underline" => Mark::new(MARK_UNDERLINE),
    "code" => Mark::new(MARK_CODE),
    other => Mark::new(other)
  }
}

fn empty_text_node() -> RichTextNode {
  RichTextNode::Text {
    value: String::new(),
    marks: Vec::new(),
    data: json!({})
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn sut() -> SanitySource {
    SanitySource {
      client: reqwest::Client::new(),
      project_id: String::from("abc123"),
      dataset: String::from("production"),
      api_version: String::from("2024-01-01"),
      token: None,
      use_cdn: false
    }
  }

  #[test]
  fn the_query_url_switches_hosts_with_the_cdn_flag() {
    let mut source = sut();
    assert_eq!(
      source.query_url(),
      "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
    );
    source.use_cdn = true;
    assert_eq!(
      source.query_url(),
      "https://abc123.apicdn.sanity.io/v2024-01-01/data/query/production"
    );
  }

  #[test]
  fn slug_queries_filter_on_the_parameter() {
    let query = news_slug_query();
    assert!(query.contains("slug.current == $slug"));
    assert!(query.ends_with("[0]"));
    assert!(gallery_slug_query().contains("slug.current == $slug"));
  }

  #[test]
  fn image_references_expand_into_cdn_urls() {
    let source = sut();
    let image = json!({
      "asset": { "_ref": "image-52ba1bb0b9-1200x800-jpg" }
    });
    assert_eq!(
      source.image_url(&image, Some(800)),
      Some(String::from(
        "https://cdn.sanity.io/images/abc123/production/52ba1bb0b9-1200x800.jpg?w=800"
      ))
    );
    assert_eq!(
      source.image_url(&image, None),
      Some(String::from(
        "https://cdn.sanity.io/images/abc123/production/52ba1bb0b9-1200x800.jpg"
      ))
    );
  }

  #[test]
  fn dereferenced_assets_keep_their_url() {
    let source = sut();
    let image = json!({
      "asset": { "url": "https://cdn.sanity.io/images/abc123/production/direct.png" }
    });
    assert_eq!(
      source.image_url(&image, Some(800)),
      Some(String::from(
        "https://cdn.sanity.io/images/abc123/production/direct.png"
      ))
    );
  }

  #[test]
  fn broken_image_references_resolve_to_nothing() {
    let source = sut();
    assert_eq!(source.image_url(&json!({}), None), None);
    assert_eq!(
      source.image_url(&json!({ "asset": { "_ref": "file-52ba-pdf" } }), None),
      None
    );
  }

  #[test]
  fn news_records_normalize_into_locale_maps() {
    let source = sut();
    let record = source.normalize_news(&json!({
      "_id": "post1",
      "titleRo": "Bun venit",
      "titleEn": "Welcome",
      "slug": { "current": "bun-venit" },
      "category": "events",
      "publicationDate": "2024-03-10",
      "featuredImage": { "asset": { "_ref": "image-aaa-800x600-jpg" } },
      "excerptRo": "Scurt rezumat",
      "additionalImages": [
        { "asset": { "_ref": "image-bbb-900x600-png" } },
        { "note": "no asset here" }
      ],
      "published": true
    }));
    assert_eq!(record["id"], json!("post1"));
    assert_eq!(record["slug"], json!("bun-venit"));
    assert_eq!(
      record["title"],
      json!({ "ro-RO": "Bun venit", "en-GB": "Welcome" })
    );
    // No English excerpt upstream, no en-GB key:
    assert_eq!(record["excerpt"], json!({ "ro-RO": "Scurt rezumat" }));
    assert_eq!(
      record["featuredImage"],
      json!("https://cdn.sanity.io/images/abc123/production/aaa-800x600.jpg?w=800")
    );
    assert_eq!(
      record["additionalImages"],
      json!(["https://cdn.sanity.io/images/abc123/production/bbb-900x600.png?w=1200"])
    );
    assert_eq!(record["content"], Value::Null);
  }

  #[test]
  fn portable_text_becomes_a_rich_text_document() {
    let source = sut();
    let record = source.normalize_news(&json!({
      "_id": "post2",
      "titleRo": "Cu continut",
      "slug": { "current": "cu-continut" },
      "contentRo": [
        {
          "_type": "block",
          "style": "h2",
          "children": [{ "_type": "span", "text": "Titlu", "marks": [] }]
        },
        {
          "_type": "block",
          "style": "normal",
          "children": [
            { "_type": "span", "text": "Text ", "marks": [] },
            { "_type": "span", "text": "gras", "marks": ["strong", "highlight"] },
            { "_type": "footnote" }
          ]
        },
        {
          "_type": "image",
          "asset": { "_ref": "image-ccc-640x480-jpg" },
          "alt": "O poza"
        },
        { "_type": "videoEmbed" }
      ],
      "published": true
    }));
    let document = &record["content"]["ro-RO"];
    assert_eq!(document["nodeType"], json!("document"));
    let content = document["content"].as_array().unwrap();
    assert_eq!(content.len(), 4);
    assert_eq!(content[0]["nodeType"], json!("heading-2"));
    assert_eq!(content[0]["content"][0]["value"], json!("Titlu"));
    assert_eq!(content[1]["nodeType"], json!("paragraph"));
    assert_eq!(
      content[1]["content"][1]["marks"],
      json!([{ "type": "bold" }, { "type": "highlight" }])
    );
    // The footnote child is kept as an empty text
    // node so the structure stays intact:
    assert_eq!(content[1]["content"][2]["value"], json!(""));
    assert_eq!(content[2]["nodeType"], json!("embedded-asset-block"));
    assert_eq!(
      content[2]["data"]["target"]["fields"]["file"]["url"],
      json!("https://cdn.sanity.io/images/abc123/production/ccc-640x480.jpg")
    );
    assert_eq!(content[2]["data"]["target"]["fields"]["title"], json!("O poza"));
    assert_eq!(content[3]["nodeType"], json!("paragraph"));
    assert_eq!(content[3]["content"][0]["value"], json!(""));
  }

  #[test]
  fn gallery_records_keep_their_image_captions() {
    let source = sut();
    let record = source.normalize_gallery(&json!({
      "_id": "album1",
      "titleRo": "Serbare",
      "slug": { "current": "serbare" },
      "eventDate": "2024-06-01",
      "coverImage": { "asset": { "_ref": "image-ddd-800x600-jpg" } },
      "images": [
        {
          "asset": { "_ref": "image-eee-900x600-jpg" },
          "alt": "Scena",
          "caption": "Corul clasei a 4-a"
        },
        { "alt": "Nothing behind this one" }
      ],
      "published": true
    }));
    assert_eq!(record["albumTitle"], json!({ "ro-RO": "Serbare" }));
    assert_eq!(record["date"], json!("2024-06-01"));
    assert_eq!(
      record["coverImage"],
      json!("https://cdn.sanity.io/images/abc123/production/ddd-800x600.jpg?w=800")
    );
    let images = record["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(
      images[0],
      json!({
        "url": "https://cdn.sanity.io/images/abc123/production/eee-900x600.jpg?w=1200",
        "alt": "Scena",
        "caption": "Corul clasei a 4-a"
      })
    );
  }

  #[test]
  fn missing_credentials_disable_the_source() {
    let mut config = Config::test_defaults();
    config.sanity_project_id = Some(String::from("abc123"));
    assert!(SanitySource::from_config(&config).is_some());
    config.sanity_project_id = Some(String::from("  "));
    assert!(SanitySource::from_config(&config).is_none());
    config.sanity_project_id = None;
    assert!(SanitySource::from_config(&config).is_none());
  }

}
