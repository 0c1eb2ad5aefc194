use crate::utils::serde_utils::is_truthy;
use serde_json::Value;

// Preference chains for the two site languages.
// Romanian first for the Romanian site, British
// English first otherwise since that's what the
// CMS space was originally configured with.
pub const RO_PREFS: [&str; 3] = ["ro-RO", "en-GB", "en-US"];
pub const EN_PREFS: [&str; 3] = ["en-GB", "en-US", "ro-RO"];
// English locales only, used to figure out whether
// a record has a real English value before falling
// back to translation:
pub const SECONDARY_PREFS: [&str; 2] = ["en-GB", "en-US"];

// Resolves a possibly locale-keyed field to a single
// value. Fields come in two shapes depending on how
// the CMS was queried: either a plain scalar (the
// locale was resolved server side) or a map like
// { "ro-RO": "...", "en-GB": "..." }.
//
// For maps we walk the preference list and take the
// first locale that's present and not null, which
// means an explicitly empty string still wins over
// later locales. When none of the preferred locales
// exist we grab whichever value in the map is truthy
// as a last resort, so a record localized in some
// unexpected language still displays something.
pub fn pick_localized<'a>(value: &'a Value, prefs: &[&str]) -> Option<&'a Value> {
  match value {
    Value::Null => None,
    Value::Object(map) => {
      for locale in prefs {
        if let Some(entry) = map.get(*locale) {
          if !entry.is_null() {
            return Some(entry);
          }
        }
      }
      map.values().find(|entry| is_truthy(entry))
    }
    scalar => Some(scalar)
  }
}

// Same resolution but strictly limited to English
// locales and without the last resort, scalars still
// pass through. A None here means the record has no
// English text at all and translating the Romanian
// value is on the table.
pub fn pick_secondary(value: &Value) -> Option<&Value> {
  match value {
    Value::Null => None,
    Value::Object(map) => {
      for locale in &SECONDARY_PREFS {
        if let Some(entry) = map.get(*locale) {
          if !entry.is_null() {
            return Some(entry);
          }
        }
      }
      None
    }
    scalar => Some(scalar)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn maps_resolve_in_preference_order() {
    let sut = json!({ "ro-RO": "Bun venit", "en-GB": "Welcome" });
    assert_eq!(
      pick_localized(&sut, &RO_PREFS),
      Some(&json!("Bun venit"))
    );
    assert_eq!(
      pick_localized(&sut, &EN_PREFS),
      Some(&json!("Welcome"))
    );
  }

  #[test]
  fn missing_locales_fall_through_the_chain() {
    let sut = json!({ "en-US": "Welcome" });
    assert_eq!(
      pick_localized(&sut, &EN_PREFS),
      Some(&json!("Welcome"))
    );
    assert_eq!(
      pick_localized(&sut, &RO_PREFS),
      Some(&json!("Welcome"))
    );
  }

  #[test]
  fn empty_strings_still_win_over_later_locales() {
    // That's what lets the mapper notice the English
    // entry exists but is empty:
    let sut = json!({ "en-GB": "", "ro-RO": "Bun venit" });
    assert_eq!(pick_localized(&sut, &EN_PREFS), Some(&json!("")));
  }

  #[test]
  fn null_entries_count_as_missing() {
    let sut = json!({ "en-GB": null, "en-US": "Welcome" });
    assert_eq!(
      pick_localized(&sut, &EN_PREFS),
      Some(&json!("Welcome"))
    );
  }

  #[test]
  fn scalars_pass_through_unchanged() {
    assert_eq!(
      pick_localized(&json!("already resolved"), &RO_PREFS),
      Some(&json!("already resolved"))
    );
    assert_eq!(pick_localized(&json!(7), &EN_PREFS), Some(&json!(7)));
    assert_eq!(pick_localized(&Value::Null, &EN_PREFS), None);
  }

  #[test]
  fn unknown_locales_are_a_last_resort() {
    let sut = json!({ "fr-FR": "Bienvenue" });
    assert_eq!(
      pick_localized(&sut, &EN_PREFS),
      Some(&json!("Bienvenue"))
    );
    // But falsy values don't qualify:
    let falsy = json!({ "fr-FR": "" });
    assert_eq!(pick_localized(&falsy, &EN_PREFS), None);
  }

  #[test]
  fn secondary_pick_never_falls_back_to_romanian() {
    let sut = json!({ "ro-RO": "Bun venit" });
    assert_eq!(pick_secondary(&sut), None);
    let with_english = json!({ "ro-RO": "Bun venit", "en-US": "Welcome" });
    assert_eq!(pick_secondary(&with_english), Some(&json!("Welcome")));
  }

}
