pub mod images;
pub mod locale;
pub mod mapper;
pub mod records;
pub mod rich_text;

// The two languages the site is served in. English
// is the default, same as the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
  Ro,
  En
}

impl Lang {
  pub fn from_query(raw: Option<&str>) -> Self {
    match raw {
      Some("ro") => Lang::Ro,
      _ => Lang::En
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anything_but_ro_means_english() {
    assert_eq!(Lang::from_query(Some("ro")), Lang::Ro);
    assert_eq!(Lang::from_query(Some("en")), Lang::En);
    assert_eq!(Lang::from_query(Some("RO")), Lang::En);
    assert_eq!(Lang::from_query(Some("fr")), Lang::En);
    assert_eq!(Lang::from_query(None), Lang::En);
  }

}
