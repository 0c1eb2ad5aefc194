use crate::utils::serde_utils::nonempty_str;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

// Rewrites image URLs that editors paste into the
// CMS into something a browser can actually load
// inside an <img> tag.
// - protocol relative URLs get https
// - Google Drive share links become direct links
// - Google Photos links are dropped entirely since
//   those point at HTML pages, not image files
// Anything else comes back unchanged, including
// strings that don't look like URLs at all.
pub fn transform_external_image_url(url: &str) -> String {
  // Since there's no way to define a const that uses
  // the heap, we need that weird lazy_static crate.
  lazy_static! {
    static ref URL_PARTS: Regex = Regex::new(
      r"^[a-zA-Z][a-zA-Z0-9+.-]*://([^/?#]+)([^?#]*)\??([^#]*)"
    ).unwrap();
    static ref DRIVE_FILE: Regex = Regex::new(
      r"/file/d/([^/]+)"
    ).unwrap();
  }

  let trimmed = url.trim();
  if trimmed.is_empty() {
    return String::new();
  }
  let absolute = if trimmed.starts_with("//") {
    format!("https:{}", trimmed)
  } else {
    trimmed.to_string()
  };
  let caps = match URL_PARTS.captures(&absolute) {
    Some(caps) => caps,
    // Relative path or not a URL, leave it alone:
    None => return absolute
  };
  let host = caps.get(1).map_or("", |m| m.as_str());
  let path = caps.get(2).map_or("", |m| m.as_str());
  let query = caps.get(3).map_or("", |m| m.as_str());

  if host.contains("drive.google.com") {
    // Share links look like /file/d/<id>/view or
    // /open?id=<id>, both have a direct download
    // counterpart:
    if let Some(file) = DRIVE_FILE.captures(path) {
      return format!(
        "https://drive.google.com/uc?export=view&id={}",
        &file[1]
      );
    }
    if let Some(id) = query_param(query, "id") {
      return format!(
        "https://drive.google.com/uc?export=view&id={}",
        id
      );
    }
    return absolute;
  }
  // Known direct-file CDNs pass through:
  if host.contains("googleusercontent.com")
    || host.contains("ctfassets.net")
    || host.contains("contentful.com")
    || host.contains("cdn.sanity.io")
  {
    return absolute;
  }
  // Google Photos share pages are HTML documents,
  // there's no image URL to be salvaged:
  if host.contains("photos.google.com") || host.contains("photos.app.goo.gl") {
    return String::new();
  }
  absolute
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
  query.split('&').find_map(|pair| match pair.split_once('=') {
    Some((key, value)) if key == name && !value.is_empty() => Some(value),
    _ => None
  })
}

// The things editors manage to put into image fields:
// plain URLs, several URLs in one string separated by
// commas or newlines, asset objects, arrays of any of
// those, or nothing at all.
enum ImageCandidate<'a> {
  Text(String),
  Node(&'a Value)
}

fn expand_image_field<'a>(field: &'a Value, out: &mut Vec<ImageCandidate<'a>>) {
  lazy_static! {
    static ref SEPARATORS: Regex = Regex::new(r"[\n,;]+").unwrap();
  }
  match field {
    Value::Null => {}
    Value::Array(items) => {
      for item in items {
        expand_image_field(item, out);
      }
    }
    Value::String(raw) => {
      let trimmed = raw.trim();
      if trimmed.is_empty() {
        return;
      }
      let parts: Vec<&str> = SEPARATORS
        .split(trimmed)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
      match parts.len() {
        0 => {}
        1 => out.push(ImageCandidate::Text(parts[0].to_string())),
        _ => {
          // Legacy records pasted several URLs into a
          // single text field, keep each one once and
          // in the order they appeared:
          let mut seen = HashSet::new();
          for part in parts {
            if seen.insert(part) {
              out.push(ImageCandidate::Text(part.to_string()));
            }
          }
        }
      }
    }
    other => out.push(ImageCandidate::Node(other))
  }
}

// Digs a usable URL out of a single image value,
// whatever shape the backend gave it.
pub fn resolve_image_url(value: &Value) -> Option<String> {
  lazy_static! {
    static ref LOCALE_KEY: Regex = Regex::new(
      r"^[a-z]{2}(-[A-Z]{2})?$"
    ).unwrap();
  }
  match value {
    Value::String(s) => nonempty(transform_external_image_url(s)),
    Value::Array(items) => items.iter().find_map(resolve_image_url),
    Value::Object(map) => {
      // Contentful asset shape. The file entry is
      // direct or keyed by locale depending on how
      // the entries were fetched:
      if let Some(file) = map.get("fields").and_then(|fields| fields.get("file")) {
        if let Some(url) = file.get("url").and_then(Value::as_str) {
          return nonempty(transform_external_image_url(url));
        }
        if let Value::Object(locales) = file {
          for entry in locales.values() {
            if let Some(url) = entry.get("url").and_then(Value::as_str) {
              if let Some(resolved) = nonempty(transform_external_image_url(url)) {
                return Some(resolved);
              }
            }
          }
        }
      }
      // Entries that already carry a plain URL, like
      // prepared gallery images or resolved Sanity
      // asset references:
      if let Some(url) = nonempty_str(map.get("url").unwrap_or(&Value::Null)) {
        return nonempty(transform_external_image_url(url));
      }
      if let Some(url) = map
        .get("asset")
        .and_then(|asset| asset.get("url"))
        .and_then(Value::as_str)
      {
        return nonempty(transform_external_image_url(url));
      }
      // A whole field fetched with every locale at
      // once is a map of locale codes to any of the
      // shapes above. Unknown keys mean this is some
      // other object and we don't want to mistake
      // random nested strings for URLs:
      if !map.is_empty() && map.keys().all(|key| LOCALE_KEY.is_match(key)) {
        return map.values().find_map(resolve_image_url);
      }
      None
    }
    _ => None
  }
}

// Flattens an image field into a list of unique,
// display ready URLs. Anything unresolvable simply
// disappears from the output.
pub fn normalize_image_array(field: &Value) -> Vec<String> {
  let mut candidates = Vec::new();
  expand_image_field(field, &mut candidates);
  let mut seen = HashSet::new();
  let mut urls = Vec::new();
  for candidate in candidates {
    let resolved = match candidate {
      ImageCandidate::Text(text) => {
        nonempty(transform_external_image_url(&text))
      }
      ImageCandidate::Node(node) => resolve_image_url(node)
    };
    if let Some(url) = resolved {
      if seen.insert(url.clone()) {
        urls.push(url);
      }
    }
  }
  urls
}

// First usable URL across several candidate fields,
// typically the asset field first and some legacy
// text field second.
pub fn resolve_first_image_url(fields: &[&Value]) -> Option<String> {
  fields
    .iter()
    .find_map(|field| normalize_image_array(field).into_iter().next())
}

fn nonempty(url: String) -> Option<String> {
  if url.is_empty() {
    None
  } else {
    Some(url)
  }
}
