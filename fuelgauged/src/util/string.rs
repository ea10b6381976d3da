//
// Copyright (c) Memfault, Inc.
// See License.txt for details
/// Strip C-style `/* */` comments from a configuration file.
pub fn remove_comments(config_string: &str) -> String {
    let mut data = String::from(config_string);
    while let Some(start) = data.find("/*") {
        match data[start..].find("*/") {
            Some(len) => data.replace_range(start..start + len + 2, ""),
            // Unterminated comment, leave the rest untouched
            None => break,
        }
    }
    data
}

/// Truncate a string to at most `max_len_bytes` bytes without splitting a
/// UTF-8 character.
pub fn truncate_on_char_boundary(s: &str, max_len_bytes: usize) -> &str {
    if s.len() <= max_len_bytes {
        return s;
    }
    let idx = (0..=max_len_bytes)
        .rev()
        .find(|idx| s.is_char_boundary(*idx))
        .unwrap_or(0);
    &s[..idx]
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("{ \"a\": 1 }", "{ \"a\": 1 }")]
    #[case("{ /* soft */ \"a\": 1 }", "{  \"a\": 1 }")]
    #[case("{ /* unterminated \"a\": 1 }", "{ /* unterminated \"a\": 1 }")]
    #[case("/* one */{}/* two */", "{}")]
    fn strips_comments(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(remove_comments(input), expected);
    }

    #[rstest]
    #[case("lvl", 25, "lvl")]
    #[case("Sending battery level now", 25, "Sending battery level now")]
    #[case("Sending battery level to collector", 25, "Sending battery level to ")]
    // The battery emoji is 4 bytes, it must not be split
    #[case("ab\u{1F50B}", 4, "ab")]
    #[case("abc", 0, "")]
    fn truncates_on_char_boundary(
        #[case] input: &str,
        #[case] max_len: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate_on_char_boundary(input, max_len), expected);
    }
}
