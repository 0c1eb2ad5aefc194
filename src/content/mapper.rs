use super::images::{
  normalize_image_array, resolve_first_image_url, resolve_image_url,
  transform_external_image_url
};
use super::locale::{pick_localized, pick_secondary, RO_PREFS};
use super::records::{GalleryAlbum, GalleryImage, NewsPost};
use super::rich_text::RichTextDocument;
use super::Lang;
use crate::translate::{Translator, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG};
use crate::utils::serde_utils::{empty_string_to_none, is_truthy, nonempty_str};
use crate::utils::time_utils;
use serde_json::Value;

// What the frontend shows when a record has no
// usable image at all:
pub const NEWS_PLACEHOLDER_IMAGE: &'static str = "/news-placeholder.jpg";
pub const GALLERY_PLACEHOLDER_IMAGE: &'static str = "/gallery-placeholder.jpg";

// Turns one raw CMS record into the API record for
// the requested language. The raw record is the
// normalized shape both backends produce: Contentful
// field names, locale maps where the backend had
// several locales, plus an injected id.
pub async fn map_news_post(item: &Value, lang: Lang, translator: &Translator) -> NewsPost {
  let title = resolve_text_field(item, "title", "titleEn", lang, translator).await;
  let excerpt = resolve_text_field(item, "excerpt", "excerptEn", lang, translator).await;
  let content = resolve_document_field(item, "content", "contentEn", lang, translator).await;
  let additional_images = pick_localized(&item["additionalImages"], &RO_PREFS)
    .map(normalize_image_array)
    .unwrap_or_default();
  NewsPost {
    id: text_of(Some(&item["id"])).unwrap_or_default(),
    title: title.display,
    title_en: title.english,
    slug: slug_of(&item["slug"]),
    category: category_of(item),
    publication_date: text_of(pick_localized(&item["publicationDate"], &RO_PREFS))
      .unwrap_or_default(),
    featured_image_url: resolve_first_image_url(&[
      &item["featuredImage"],
      &item["featuredImageUrl"]
    ])
    .unwrap_or_else(|| NEWS_PLACEHOLDER_IMAGE.to_string()),
    excerpt: excerpt.display,
    excerpt_en: excerpt.english,
    content: content.display,
    content_en: content.english,
    additional_images,
    facebook_link: text_of(pick_localized(&item["facebookLink"], &RO_PREFS)),
    published: coerce_published(&item["published"]),
    original_title_ro: title.native,
    original_excerpt_ro: excerpt.native,
    original_content_ro: content.native
  }
}

pub async fn map_gallery_album(
  item: &Value,
  lang: Lang,
  translator: &Translator
) -> GalleryAlbum {
  let title = resolve_text_field(item, "albumTitle", "albumTitleEn", lang, translator).await;
  let description =
    resolve_text_field(item, "description", "descriptionEn", lang, translator).await;
  GalleryAlbum {
    id: text_of(Some(&item["id"])).unwrap_or_default(),
    album_title: title.display,
    album_title_en: title.english,
    slug: slug_of(&item["slug"]),
    category: category_of(item),
    cover_image_url: resolve_first_image_url(&[
      &item["coverImage"],
      &item["coverImageUrl"]
    ])
    .unwrap_or_else(|| GALLERY_PLACEHOLDER_IMAGE.to_string()),
    images: gallery_images(&item["images"]),
    description: empty_string_to_none(Some(description.display)),
    description_en: description.english,
    date: text_of(pick_localized(&item["date"], &RO_PREFS)),
    published: coerce_published(&item["published"]),
    original_album_title_ro: title.native,
    original_description_ro: description.native
  }
}

// Both collections come back newest first no matter
// what order the backend used.
pub fn sort_news_newest_first(posts: &mut Vec<NewsPost>) {
  posts.sort_by(|a, b| {
    time_utils::newest_first(&a.publication_date, &b.publication_date)
  });
}

pub fn sort_albums_newest_first(albums: &mut Vec<GalleryAlbum>) {
  albums.sort_by(|a, b| {
    time_utils::newest_first(
      a.date.as_deref().unwrap_or(""),
      b.date.as_deref().unwrap_or("")
    )
  });
}

// A record counts as published when any locale says
// so. Hiding a post in one language only would just
// make the two sites inconsistent.
pub fn coerce_published(value: &Value) -> bool {
  match value {
    Value::Object(map) => map.values().any(is_truthy),
    other => is_truthy(other)
  }
}

struct TextSlots {
  display: String,
  english: String,
  native: Option<String>
}

// The localized text decision table. Three sources
// feed it: the locale map of the main field, a
// legacy scalar *En field some old records still
// carry, and as a last resort for English output,
// machine translation of the Romanian text.
async fn resolve_text_field(
  item: &Value,
  field: &str,
  legacy_field: &str,
  lang: Lang,
  translator: &Translator
) -> TextSlots {
  let value = &item[field];
  let native = text_of(pick_localized(value, &RO_PREFS));
  let explicit = text_of(pick_secondary(value));
  let legacy = nonempty_str(&item[legacy_field]).map(String::from);
  match lang {
    Lang::Ro => {
      let english = explicit.or(legacy);
      TextSlots {
        display: native.clone().or_else(|| english.clone()).unwrap_or_default(),
        english: english.unwrap_or_default(),
        native
      }
    }
    Lang::En => {
      let mut english = explicit.or(legacy);
      if english.is_none() && translator.is_configured() {
        if let Some(source) = &native {
          english = Some(
            translator
              .translate_text(source, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG)
              .await
          );
        }
      }
      TextSlots {
        // When there's no English and no translation
        // the Romanian text shows rather than a hole
        // in the page:
        display: english.clone().or_else(|| native.clone()).unwrap_or_default(),
        english: english.unwrap_or_default(),
        native
      }
    }
  }
}

struct DocumentSlots {
  display: RichTextDocument,
  english: RichTextDocument,
  native: Option<RichTextDocument>
}

// Same decision table for rich text documents, with
// empty documents treated as missing.
async fn resolve_document_field(
  item: &Value,
  field: &str,
  legacy_field: &str,
  lang: Lang,
  translator: &Translator
) -> DocumentSlots {
  let value = &item[field];
  let native = pick_localized(value, &RO_PREFS)
    .and_then(RichTextDocument::parse)
    .filter(|doc| !doc.is_empty());
  let explicit = pick_secondary(value)
    .and_then(RichTextDocument::parse)
    .filter(|doc| !doc.is_empty());
  let legacy =
    RichTextDocument::parse(&item[legacy_field]).filter(|doc| !doc.is_empty());
  match lang {
    Lang::Ro => {
      let english = explicit.or(legacy);
      DocumentSlots {
        display: native
          .clone()
          .or_else(|| english.clone())
          .unwrap_or_else(RichTextDocument::empty),
        english: english.unwrap_or_else(RichTextDocument::empty),
        native
      }
    }
    Lang::En => {
      let mut english = explicit.or(legacy);
      if english.is_none() && translator.is_configured() {
        if let Some(native_doc) = &native {
          english = Some(translator.translate_document(native_doc.clone()).await);
        }
      }
      DocumentSlots {
        display: english
          .clone()
          .or_else(|| native.clone())
          .unwrap_or_else(RichTextDocument::empty),
        english: english.unwrap_or_else(RichTextDocument::empty),
        native
      }
    }
  }
}

fn gallery_images(value: &Value) -> Vec<GalleryImage> {
  let images = match pick_localized(value, &RO_PREFS) {
    Some(picked) => picked,
    None => return Vec::new()
  };
  match images {
    Value::Array(items) => items.iter().filter_map(gallery_image_entry).collect(),
    _ => Vec::new()
  }
}

// One gallery image from whatever the backend sent:
// a plain URL string, a prepared { url, alt,
// caption } object, or a raw asset.
fn gallery_image_entry(value: &Value) -> Option<GalleryImage> {
  match value {
    Value::Object(map) => {
      let url = match nonempty_str(map.get("url").unwrap_or(&Value::Null)) {
        Some(direct) => {
          let transformed = transform_external_image_url(direct);
          if transformed.is_empty() {
            return None;
          }
          transformed
        }
        None => resolve_image_url(value)?
      };
      Some(GalleryImage {
        url,
        alt: text_of(map.get("alt")),
        caption: text_of(map.get("caption"))
      })
    }
    other => resolve_image_url(other).map(|url| GalleryImage {
      url,
      alt: None,
      caption: None
    })
  }
}

fn text_of(value: Option<&Value>) -> Option<String> {
  value.and_then(nonempty_str).map(String::from)
}

fn slug_of(value: &Value) -> String {
  if let Some(slug) = nonempty_str(value) {
    return slug.to_string();
  }
  // Slugs from the query backend look like
  // { "current": "..." } when nothing unwrapped
  // them yet:
  if let Some(slug) = value.get("current").and_then(Value::as_str) {
    return slug.to_string();
  }
  text_of(pick_localized(value, &RO_PREFS)).unwrap_or_default()
}

fn category_of(item: &Value) -> String {
  text_of(pick_localized(&item["category"], &RO_PREFS)).unwrap_or_default()
}
