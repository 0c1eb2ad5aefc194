use super::rich_text::RichTextDocument;
use serde::{Deserialize, Serialize};

// The records the API hands out, already resolved
// for one display language. The original* fields
// keep the untouched Romanian values around so the
// frontend can offer a "show original" toggle, they
// only get serialized when there's something in
// them.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPost {
  pub id: String,
  pub title: String,
  pub title_en: String,
  pub slug: String,
  pub category: String,
  pub publication_date: String,
  pub featured_image_url: String,
  pub excerpt: String,
  pub excerpt_en: String,
  pub content: RichTextDocument,
  pub content_en: RichTextDocument,
  pub additional_images: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub facebook_link: Option<String>,
  pub published: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub original_title_ro: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub original_excerpt_ro: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub original_content_ro: Option<RichTextDocument>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
  pub url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub alt: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub caption: Option<String>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryAlbum {
  pub id: String,
  pub album_title: String,
  pub album_title_en: String,
  pub slug: String,
  pub category: String,
  pub cover_image_url: String,
  pub images: Vec<GalleryImage>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub description_en: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date: Option<String>,
  pub published: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub original_album_title_ro: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub original_description_ro: Option<String>
}
