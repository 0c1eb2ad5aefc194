// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub bind_address: String,
  // Either "contentful" or "sanity". Anything
  // else falls back to "contentful".
  pub cms_backend: String,
  // Contentful-style REST backend settings:
  pub contentful_api_base: String,
  #[serde(default)]
  pub contentful_space_id: Option<String>,
  #[serde(default)]
  pub contentful_access_token: Option<String>,
  pub contentful_environment: String,
  pub contentful_news_content_type: String,
  pub contentful_gallery_content_type: String,
  pub contentful_locale: String,
  pub contentful_include_depth: u32,
  // Sanity-style query backend settings:
  #[serde(default)]
  pub sanity_project_id: Option<String>,
  pub sanity_dataset: String,
  pub sanity_api_version: String,
  #[serde(default)]
  pub sanity_api_token: Option<String>,
  pub sanity_use_cdn: bool,
  // Comma separated list of machine translation
  // endpoints, tried in order:
  pub translate_endpoints: String,
  pub translate_cache_max: usize,
  // Rate limiter settings:
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32
}

impl Config {

  pub fn from_env() -> Result<Config> {
    let mut c = config::Config::new();
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // Let's set other default values. You have
    // to use lowercase when compared to what's
    // in the .env file.
    c.set_default("bind_address", "127.0.0.1:8080")?;
    c.set_default("cms_backend", "contentful")?;
    c.set_default("contentful_api_base", "https://cdn.contentful.com")?;
    c.set_default("contentful_environment", "master")?;
    c.set_default("contentful_news_content_type", "newsPost")?;
    c.set_default("contentful_gallery_content_type", "galleryAlbum")?;
    // All-locales responses, which is what the
    // locale fallback logic expects:
    c.set_default("contentful_locale", "*")?;
    // Enough to resolve asset links nested in
    // rich text documents:
    c.set_default("contentful_include_depth", 2)?;
    c.set_default("sanity_dataset", "production")?;
    c.set_default("sanity_api_version", "2024-01-01")?;
    c.set_default("sanity_use_cdn", false)?;
    // Free public instances, primary first:
    c.set_default(
      "translate_endpoints",
      "https://libretranslate.com/translate,\
       https://api.mymemory.translated.net/get"
    )?;
    c.set_default("translate_cache_max", 500)?;
    // Settings for the basic rate limiter, mostly
    // there to protect the translation endpoint:
    c.set_default("rl_max_requests", 60)?;
    c.set_default("rl_max_requests_time", 60)?;
    c.set_default("rl_block_duration", 120)?;

    c.merge(config::Environment::default())?;
    // The error has to be given a context for
    // color_eyre to work here:
    c.try_into()
      .context("Loading configuration from env")
  }

  // The defaults from above as a plain struct,
  // without going through the environment. Tests
  // tweak single fields from here.
  #[cfg(test)]
  pub fn test_defaults() -> Config {
    Config {
      bind_address: String::from("127.0.0.1:8080"),
      cms_backend: String::from("contentful"),
      contentful_api_base: String::from("https://cdn.contentful.com"),
      contentful_space_id: None,
      contentful_access_token: None,
      contentful_environment: String::from("master"),
      contentful_news_content_type: String::from("newsPost"),
      contentful_gallery_content_type: String::from("galleryAlbum"),
      contentful_locale: String::from("*"),
      contentful_include_depth: 2,
      sanity_project_id: None,
      sanity_dataset: String::from("production"),
      sanity_api_version: String::from("2024-01-01"),
      sanity_api_token: None,
      sanity_use_cdn: false,
      translate_endpoints: String::new(),
      translate_cache_max: 500,
      rl_max_requests: 60,
      rl_max_requests_time: 60,
      rl_block_duration: 120
    }
  }

}
