use serde_json::Value;

// Empty string to None in the DTO conversions
// using a plain old function here:
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.is_empty()
      { None } else { Some(s) },
    None => None
  }
}

// The CMS payloads were historically consumed by
// Javascript clients and some fields rely on its
// loose notion of truthiness, which I'm keeping:
// null and false are falsy, "" is falsy, 0 is
// falsy, everything else (including "0", empty
// arrays and empty objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) => true,
    Value::Object(_) => true
  }
}

// Borrow a string out of a JSON value but only
// when there's actually something in it.
pub fn nonempty_str(value: &Value) -> Option<&str> {
  match value.as_str() {
    Some(s) if !s.is_empty() => Some(s),
    _ => None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn truthiness_follows_the_loose_rules() {
    assert!(!is_truthy(&Value::Null));
    assert!(!is_truthy(&json!(false)));
    assert!(!is_truthy(&json!("")));
    assert!(!is_truthy(&json!(0)));
    assert!(is_truthy(&json!(true)));
    assert!(is_truthy(&json!("0")));
    assert!(is_truthy(&json!(" ")));
    assert!(is_truthy(&json!(42)));
    assert!(is_truthy(&json!([])));
    assert!(is_truthy(&json!({})));
  }

  #[test]
  fn nonempty_str_rejects_empty_and_non_strings() {
    assert_eq!(nonempty_str(&json!("hello")), Some("hello"));
    assert_eq!(nonempty_str(&json!("")), None);
    assert_eq!(nonempty_str(&json!(12)), None);
    assert_eq!(nonempty_str(&Value::Null), None);
  }

  #[test]
  fn empty_string_becomes_none() {
    assert_eq!(empty_string_to_none(Some(String::new())), None);
    let sut = Some(String::from("keep"));
    assert_eq!(empty_string_to_none(sut), Some(String::from("keep")));
  }

}
