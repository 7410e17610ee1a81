use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

/// Extracts the `charset=` parameter from a `Content-Type` header value.
pub fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Picks the encoding of a response body.
///
/// Order: BOM, then the declared charset, then strict UTF-8, then a
/// `chardetng` guess. The endpoint tends to mislabel or omit charsets when it
/// answers with a legacy Japanese encoding.
pub fn detect_body_encoding(
    bytes: &[u8],
    content_type: Option<&str>,
) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }

    if let Some(label) = content_type.and_then(charset_from_content_type) {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => return (encoding, 0),
            None => debug!(label, "unknown charset label, sniffing instead"),
        }
    }

    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), 0)
}

/// Decodes a response body to text, replacing malformed sequences.
pub fn decode_body<'a>(bytes: &'a [u8], content_type: Option<&str>) -> Cow<'a, str> {
    let (encoding, bom_len) = detect_body_encoding(bytes, content_type);
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);

    if had_errors {
        warn!(
            encoding = encoding.name(),
            "response body had malformed sequences"
        );
    }

    text
}
