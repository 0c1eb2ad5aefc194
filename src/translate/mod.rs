use crate::config::Config;
use crate::content::rich_text::{RichTextDocument, RichTextNode};
use crate::utils::text_utils::bounded_prefix;
use derive_more::Display;
use futures::future::{join_all, BoxFuture, FutureExt};
use log::{debug, warn};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::collections::VecDeque;
use std::sync::RwLock;
use std::time::Duration;

pub const DEFAULT_SOURCE_LANG: &'static str = "ro";
pub const DEFAULT_TARGET_LANG: &'static str = "en";

// Cache keys only hash a prefix of the text. Rich
// text paragraphs can get long and the first 50
// characters are plenty to tell entries apart:
const CACHE_KEY_PREFIX_CHARS: usize = 50;
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Display)]
pub enum TranslateError {
  #[display(fmt = "no translation endpoints are configured")]
  NotConfigured,
  #[display(fmt = "every endpoint failed, last error - {}", _0)]
  Upstream(String)
}

impl std::error::Error for TranslateError {}

// Client for the public machine translation
// services. Endpoints are tried in the order they
// appear in the config until one of them produces
// a usable translation.
pub struct Translator {
  client: reqwest::Client,
  endpoints: Vec<String>,
  cache: RwLock<TranslationCache>
}

impl Translator {

  pub fn new(endpoints: Vec<String>, cache_capacity: usize) -> Self {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .expect("Could not build the translation HTTP client");
    Self {
      client,
      endpoints,
      cache: RwLock::new(TranslationCache::new(cache_capacity))
    }
  }

  pub fn from_config(config: &Config) -> Self {
    let endpoints = config
      .translate_endpoints
      .split(',')
      .map(str::trim)
      .filter(|endpoint| !endpoint.is_empty())
      .map(String::from)
      .collect();
    Self::new(endpoints, config.translate_cache_max)
  }

  pub fn is_configured(&self) -> bool {
    !self.endpoints.is_empty()
  }

  // Translation that never fails: on any problem the
  // original text comes back and the site shows
  // Romanian instead of nothing.
  pub async fn translate_text(&self, text: &str, source: &str, target: &str) -> String {
    match self.translate_cached(text, source, target).await {
      Ok(translated) => translated,
      Err(e) => {
        warn!("Keeping the original text, translation failed - {}", e);
        text.to_string()
      }
    }
  }

  // Same thing but the caller gets to see failures,
  // the /api/translate endpoint wants to report them.
  pub async fn translate_cached(
    &self,
    text: &str,
    source: &str,
    target: &str
  ) -> Result<String, TranslateError> {
    if text.trim().is_empty() {
      return Ok(text.to_string());
    }
    let key = cache_key(text, source, target);
    if let Some(hit) = self.cache_get(&key) {
      debug!("Translation cache hit for {}", key);
      return Ok(hit);
    }
    let translated = self.try_translate(text, source, target).await?;
    self.cache_put(key, translated.clone());
    Ok(translated)
  }

  pub async fn try_translate(
    &self,
    text: &str,
    source: &str,
    target: &str
  ) -> Result<String, TranslateError> {
    if self.endpoints.is_empty() {
      return Err(TranslateError::NotConfigured);
    }
    let mut last_error = String::from("no endpoint was tried");
    for endpoint in &self.endpoints {
      match self.request_translation(endpoint, text, source, target).await {
        Ok(translated) => {
          if translated.trim().is_empty() {
            last_error = format!("{} returned an empty translation", endpoint);
            warn!("{}", last_error);
          } else {
            return Ok(translated);
          }
        }
        Err(e) => {
          last_error = format!("{} - {}", endpoint, e);
          warn!("Translation endpoint failed: {}", last_error);
        }
      }
    }
    Err(TranslateError::Upstream(last_error))
  }

  // The two free services speak different dialects:
  // MyMemory is a GET with a langpair parameter,
  // everything else is assumed to talk like
  // LibreTranslate, a JSON POST.
  async fn request_translation(
    &self,
    endpoint: &str,
    text: &str,
    source: &str,
    target: &str
  ) -> Result<String, String> {
    if endpoint.contains("mymemory") {
      let langpair = format!("{}|{}", source, target);
      let response = self
        .client
        .get(endpoint)
        .query(&[("q", text), ("langpair", langpair.as_str())])
        .send()
        .await
        .map_err(|e| e.to_string())?;
      let status = response.status();
      // Read as text first so a failed JSON parse
      // still leaves us an error body to log:
      let body = response.text().await.map_err(|e| e.to_string())?;
      if !status.is_success() {
        return Err(format!("HTTP {} - {}", status.as_u16(), snippet(&body)));
      }
      let json: Value =
        serde_json::from_str(&body).map_err(|e| e.to_string())?;
      json["responseData"]["translatedText"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| String::from("no responseData.translatedText in the response"))
    } else {
      let payload = serde_json::json!({
        "q": text,
        "source": source,
        "target": target,
        "format": "text"
      });
      let response = self
        .client
        .post(endpoint)
        .json(&payload)
        .send()
        .await
        .map_err(|e| e.to_string())?;
      let status = response.status();
      let body = response.text().await.map_err(|e| e.to_string())?;
      if !status.is_success() {
        return Err(format!("HTTP {} - {}", status.as_u16(), snippet(&body)));
      }
      let json: Value =
        serde_json::from_str(&body).map_err(|e| e.to_string())?;
      json["translatedText"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| String::from("no translatedText in the response"))
    }
  }

  // Walks a rich text document and translates every
  // text leaf, everything else is carried over as it
  // is. Failures leave the Romanian text in place so
  // a half translated document is still readable.
  pub async fn translate_document(&self, document: RichTextDocument) -> RichTextDocument {
    let content = join_all(
      document
        .content
        .into_iter()
        .map(|node| self.translate_node(node))
    )
    .await;
    RichTextDocument {
      data: document.data,
      content
    }
  }

  // Recursing through an async fn needs the boxed
  // future indirection or the compiler can't size
  // the future type.
  fn translate_node(&self, node: RichTextNode) -> BoxFuture<'_, RichTextNode> {
    async move {
      match node {
        RichTextNode::Text { value, marks, data } => {
          let value = self
            .translate_text(&value, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG)
            .await;
          RichTextNode::Text { value, marks, data }
        }
        RichTextNode::Block {
          node_type,
          data,
          content
        } => {
          let content =
            join_all(content.into_iter().map(|child| self.translate_node(child)))
              .await;
          RichTextNode::Block {
            node_type,
            data,
            content
          }
        }
        other => other
      }
    }
    .boxed()
  }

  fn cache_get(&self, key: &str) -> Option<String> {
    match self.cache.read() {
      Ok(cache) => cache.get(key).cloned(),
      Err(_) => None
    }
  }

  fn cache_put(&self, key: String, value: String) {
    if let Ok(mut cache) = self.cache.write() {
      cache.add(key, value);
    }
  }

  #[cfg(test)]
  pub fn seed_cache(&self, text: &str, source: &str, target: &str, translated: &str) {
    self.cache_put(cache_key(text, source, target), translated.to_string());
  }

}

fn cache_key(text: &str, source: &str, target: &str) -> String {
  let mut hasher = Sha1::new();
  hasher.update(source.as_bytes());
  hasher.update(b"|");
  hasher.update(target.as_bytes());
  hasher.update(b"|");
  hasher.update(bounded_prefix(text, CACHE_KEY_PREFIX_CHARS).as_bytes());
  hex::encode(hasher.finalize())
}

fn snippet(body: &str) -> &str {
  bounded_prefix(body, 200)
}

// Bounded FIFO cache. A linear scan is plenty at
// this size and the VecDeque makes the eviction
// order obvious. Lookups go newest first so a
// re-added key finds its fresh value.
struct TranslationCache {
  entries: VecDeque<(String, String)>,
  capacity: usize
}

impl TranslationCache {

  pub fn new(capacity: usize) -> Self {
    Self {
      entries: VecDeque::with_capacity(capacity),
      capacity
    }
  }

  pub fn add(&mut self, key: String, value: String) {
    if self.capacity == 0 {
      return;
    }
    if self.entries.len() >= self.capacity {
      self.entries.pop_front();
    }
    self.entries.push_back((key, value));
  }

  pub fn get(&self, key: &str) -> Option<&String> {
    for entry in self.entries.iter().rev() {
      if entry.0 == key {
        return Some(&entry.1);
      }
    }
    None
  }

}


#[cfg(test)]
mod tests {
  use super::test_support::{json_response, stub_endpoint};
  use super::*;
  use crate::content::rich_text::{Mark, MARK_BOLD, NODE_PARAGRAPH};
  use serde_json::json;

  #[tokio::test]
  async fn blank_text_never_hits_the_network() {
    let sut = Translator::new(vec![], 10);
    assert_eq!(sut.translate_text("", "ro", "en").await, "");
    assert_eq!(sut.translate_text("   ", "ro", "en").await, "   ");
  }

  #[tokio::test]
  async fn no_endpoints_means_the_text_comes_back() {
    let sut = Translator::new(vec![], 10);
    assert!(!sut.is_configured());
    assert_eq!(
      sut.translate_text("Bun venit", "ro", "en").await,
      "Bun venit"
    );
    match sut.translate_cached("Bun venit", "ro", "en").await {
      Err(TranslateError::NotConfigured) => {}
      other => panic!("expected NotConfigured, got {:?}", other)
    }
  }

  #[tokio::test]
  async fn cached_translations_skip_the_network() {
    let sut = Translator::new(vec![], 10);
    sut.seed_cache("Bun venit", "ro", "en", "Welcome");
    assert_eq!(
      sut.translate_text("Bun venit", "ro", "en").await,
      "Welcome"
    );
    // Same text towards another language is a
    // different entry and misses:
    assert_eq!(
      sut.translate_text("Bun venit", "ro", "fr").await,
      "Bun venit"
    );
  }

  #[test]
  fn cache_keys_only_look_at_the_text_prefix() {
    let a = "x".repeat(60);
    let b = format!("{}different tail", "x".repeat(50));
    assert_eq!(cache_key(&a, "ro", "en"), cache_key(&b, "ro", "en"));
    assert_ne!(cache_key(&a, "ro", "en"), cache_key(&a, "ro", "fr"));
    assert_ne!(cache_key(&a, "ro", "en"), cache_key(&a, "en", "ro"));
  }

  #[test]
  fn cache_evicts_oldest_entries_first() {
    let mut sut = TranslationCache::new(2);
    sut.add(String::from("k1"), String::from("one"));
    sut.add(String::from("k2"), String::from("two"));
    sut.add(String::from("k3"), String::from("three"));
    assert_eq!(sut.get("k1"), None);
    assert_eq!(sut.get("k2"), Some(&String::from("two")));
    assert_eq!(sut.get("k3"), Some(&String::from("three")));
  }

  #[test]
  fn a_zero_capacity_cache_stores_nothing() {
    let mut sut = TranslationCache::new(0);
    sut.add(String::from("k1"), String::from("one"));
    assert_eq!(sut.get("k1"), None);
  }

  #[tokio::test]
  async fn failing_endpoints_fail_over_in_order() {
    let bad = stub_endpoint(vec![json_response(
      "503 Service Unavailable",
      r#"{"error":"down"}"#
    )]);
    let good = stub_endpoint(vec![json_response(
      "200 OK",
      r#"{"translatedText":"Welcome"}"#
    )]);
    let sut = Translator::new(
      vec![format!("{}/translate", bad), format!("{}/translate", good)],
      10
    );
    let result = sut.try_translate("Bun venit", "ro", "en").await;
    assert_eq!(result.unwrap(), "Welcome");
  }

  #[tokio::test]
  async fn the_mymemory_dialect_is_understood() {
    let base = stub_endpoint(vec![json_response(
      "200 OK",
      r#"{"responseData":{"translatedText":"Welcome"},"responseStatus":200}"#
    )]);
    let sut = Translator::new(vec![format!("{}/mymemory/get", base)], 10);
    let result = sut.try_translate("Bun venit", "ro", "en").await;
    assert_eq!(result.unwrap(), "Welcome");
  }

  #[tokio::test]
  async fn when_every_endpoint_fails_the_text_survives() {
    let bad = stub_endpoint(vec![json_response(
      "500 Internal Server Error",
      r#"{"error":"boom"}"#
    )]);
    let sut = Translator::new(vec![format!("{}/translate", bad)], 10);
    assert_eq!(
      sut.translate_text("Bun venit", "ro", "en").await,
      "Bun venit"
    );
    // The failure must not poison the cache:
    let key = cache_key("Bun venit", "ro", "en");
    assert!(sut.cache_get(&key).is_none());
  }

  #[tokio::test]
  async fn document_translation_only_touches_text_leaves() {
    let sut = Translator::new(vec![], 10);
    sut.seed_cache("Bun", "ro", "en", "Good");
    sut.seed_cache("venit", "ro", "en", "come");
    let document = RichTextDocument::new(vec![
      RichTextNode::Block {
        node_type: NODE_PARAGRAPH.to_string(),
        data: json!({}),
        content: vec![
          RichTextNode::Text {
            value: String::from("Bun"),
            marks: vec![],
            data: json!({})
          },
          RichTextNode::Text {
            value: String::from("venit"),
            marks: vec![Mark::new(MARK_BOLD)],
            data: json!({})
          }
        ]
      },
      RichTextNode::EmbeddedAsset {
        data: json!({ "src": "x" })
      }
    ]);
    let translated = sut.translate_document(document).await;
    assert_eq!(translated.content.len(), 2);
    match &translated.content[0] {
      RichTextNode::Block { content, .. } => {
        match &content[0] {
          RichTextNode::Text { value, .. } => assert_eq!(value, "Good"),
          other => panic!("expected text, got {:?}", other)
        }
        match &content[1] {
          RichTextNode::Text { value, marks, .. } => {
            assert_eq!(value, "come");
            // Marks ride along untouched:
            assert_eq!(marks, &vec![Mark::new(MARK_BOLD)]);
          }
          other => panic!("expected text, got {:?}", other)
        }
      }
      other => panic!("expected a block, got {:?}", other)
    }
    match &translated.content[1] {
      RichTextNode::EmbeddedAsset { data } => {
        assert_eq!(data, &json!({ "src": "x" }));
      }
      other => panic!("expected the embedded asset, got {:?}", other)
    }
  }

}
