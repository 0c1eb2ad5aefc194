// Cuts a string down to a maximum number of
// characters without ever landing in the middle
// of a multibyte sequence. Slicing by bytes
// would panic on Romanian diacritics.
pub fn bounded_prefix(s: &str, max_chars: usize) -> &str {
  match s.char_indices().nth(max_chars) {
    Some((index, _)) => &s[..index],
    None => s
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_strings_come_back_whole() {
    let sut = "hello";
    assert_eq!(bounded_prefix(sut, 50), "hello");
  }

  #[test]
  fn long_strings_get_cut() {
    let sut = "abcdefghij";
    assert_eq!(bounded_prefix(sut, 4), "abcd");
  }

  #[test]
  fn diacritics_count_as_single_characters() {
    // 4 chars but more than 4 bytes:
    let sut = "șțăî";
    assert_eq!(bounded_prefix(sut, 3), "șță");
    assert_eq!(bounded_prefix(sut, 4), "șțăî");
  }

}
