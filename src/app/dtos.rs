use serde::{Deserialize, Serialize};

// The display records in content::records are
// already the response DTOs, this module only has
// the request-side objects and the error body.

#[derive(Serialize, Deserialize)]
pub struct LangQuery {
  pub lang: Option<String>
}

// Body of the translation endpoint. The canonical
// key is "q" but some historical clients send
// "text" instead, both are accepted.
#[derive(Deserialize)]
pub struct TranslateBody {
  pub q: Option<String>,
  pub text: Option<String>,
  pub source: Option<String>,
  pub target: Option<String>
}

impl TranslateBody {

  pub fn query_text(&self) -> Option<&str> {
    nonempty(&self.q).or_else(|| nonempty(&self.text))
  }

  pub fn source_lang(&self) -> Option<&str> {
    nonempty(&self.source)
  }

  pub fn target_lang(&self) -> Option<&str> {
    nonempty(&self.target)
  }

}

fn nonempty(field: &Option<String>) -> Option<&str> {
  field
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
  pub translated_text: String
}

// Every error response is {"error": "..."}, same
// as what the frontend already parses.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
  pub error: String
}
