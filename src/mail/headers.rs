// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! RFC 2047 encoded-word decoding for display headers.
//!
//! Gmail hands back header values exactly as they appear on the wire, so a
//! subject like `=?UTF-8?Q?Caf=C3=A9?=` has to be decoded before it is shown
//! or fed to the reply generator. Only UTF-8, US-ASCII and ISO-8859-1 are
//! decoded; unknown charsets are left as the raw encoded word.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use regex::Regex;

lazy_static::lazy_static! {
    static ref ENCODED_WORD_RE: Regex = Regex::new(
        r"=\?([^?\s]+)\?([BbQq])\?([^?\s]*)\?="
    ).expect("encoded-word pattern is valid");
}

/// Decode every encoded word in `input`, leaving plain text untouched.
///
/// Whitespace between two adjacent encoded words is dropped, as RFC 2047
/// section 6.2 requires.
pub fn decode_header_value(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;
    let mut previous_was_word = false;

    for cap in ENCODED_WORD_RE.captures_iter(input) {
        let whole = match cap.get(0) {
            Some(m) => m,
            None => continue,
        };
        let gap = &input[last_end..whole.start()];
        if !(previous_was_word && gap.trim().is_empty()) {
            result.push_str(gap);
        }

        match decode_word(&cap[1], &cap[2], &cap[3]) {
            Some(decoded) => result.push_str(&decoded),
            None => result.push_str(whole.as_str()),
        }

        last_end = whole.end();
        previous_was_word = true;
    }

    result.push_str(&input[last_end..]);
    result
}

fn decode_word(charset: &str, encoding: &str, text: &str) -> Option<String> {
    let bytes = if encoding.eq_ignore_ascii_case("B") {
        BASE64.decode(text).ok()?
    } else {
        decode_q(text)
    };

    // RFC 2231 allows a language suffix: "UTF-8*en".
    let charset = charset.split('*').next().unwrap_or(charset).to_ascii_lowercase();
    match charset.as_str() {
        "utf-8" | "utf8" | "us-ascii" => Some(String::from_utf8_lossy(&bytes).into_owned()),
        "iso-8859-1" | "latin1" => Some(bytes.iter().map(|&b| b as char).collect()),
        _ => None,
    }
}

fn decode_q(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                match hex_pair(bytes[i + 1], bytes[i + 2]) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    out
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(decode_header_value("Quarterly report"), "Quarterly report");
    }

    #[test]
    fn test_q_encoding_utf8() {
        assert_eq!(decode_header_value("=?UTF-8?Q?Caf=C3=A9_tomorrow?="), "Café tomorrow");
    }

    #[test]
    fn test_b_encoding_utf8() {
        // "Grüße"
        assert_eq!(decode_header_value("=?utf-8?B?R3LDvMOfZQ==?="), "Grüße");
    }

    #[test]
    fn test_adjacent_words_join_without_space() {
        let input = "=?UTF-8?Q?Hello_?= =?UTF-8?Q?World?=";
        assert_eq!(decode_header_value(input), "Hello World");
    }

    #[test]
    fn test_mixed_plain_and_encoded() {
        let input = "Re: =?ISO-8859-1?Q?r=E9sum=E9?= attached";
        assert_eq!(decode_header_value(input), "Re: résumé attached");
    }

    #[test]
    fn test_unknown_charset_left_raw() {
        let input = "=?KOI8-R?B?8NLJ18XU?=";
        assert_eq!(decode_header_value(input), input);
    }

    #[test]
    fn test_trailing_equals_in_q_word() {
        assert_eq!(decode_header_value("=?UTF-8?Q?a=3?="), "a=3");
    }
}
