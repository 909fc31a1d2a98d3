// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Plain-text body extraction from a Gmail MIME payload.
//!
//! Order of preference:
//! 1. inline body data on the top-level payload
//! 2. the first direct `text/plain` child with data
//! 3. the first direct `text/html` child with data, tags stripped
//!
//! Only direct children are inspected. A `text/plain` part nested inside a
//! `multipart/alternative` inside a `multipart/mixed` is not found, and the
//! body comes back empty for such messages.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine as _,
};
use log::debug;
use regex::Regex;

use crate::gmail::types::MessagePart;

/// Maximum body length in characters before truncation.
pub const MAX_BODY_CHARS: usize = 500;
pub const TRUNCATION_MARKER: &str = "...";

lazy_static::lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]*>").expect("tag pattern is valid");
}

/// Extract, normalize and truncate the readable body of `payload`.
pub fn extract_body(payload: &MessagePart) -> String {
    let raw = inline_body(payload)
        .or_else(|| first_part_text(payload, "text/plain"))
        .or_else(|| first_part_text(payload, "text/html").map(|html| strip_html(&html)))
        .unwrap_or_default();

    truncate(normalize(&raw))
}

fn inline_body(payload: &MessagePart) -> Option<String> {
    payload.body_data().and_then(decode_body_data)
}

fn first_part_text(payload: &MessagePart, mime: &str) -> Option<String> {
    payload
        .parts
        .iter()
        .filter(|part| part.is_mime(mime))
        .find_map(|part| part.body_data().and_then(decode_body_data))
}

/// Decode Gmail body data. Gmail uses the URL-safe alphabet; padding and the
/// standard alphabet are tolerated.
pub fn decode_body_data(data: &str) -> Option<String> {
    let trimmed = data.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed));

    match bytes {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!("Skipping undecodable body data: {}", e);
            None
        }
    }
}

/// Remove anything that looks like a tag. Not an HTML parser.
pub fn strip_html(html: &str) -> String {
    HTML_TAG_RE.replace_all(html, "").into_owned()
}

fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

fn truncate(text: String) -> String {
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => {
            let mut truncated = text[..cut].to_string();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => text,
    }
}
