//! Small helpers shared by the loaders and writers.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Decode bytes to a string, handling various encodings.
///
/// Tries UTF-8 first (a BOM is handled by encoding_rs), then the hint
/// encoding from the XML declaration, then Windows-1252.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode an XML file's bytes, honouring its declared encoding.
pub fn decode_xml(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

/// Encode serialized output in the configured document encoding.
///
/// Unknown labels fall back to UTF-8.
pub fn encode_text<'a>(text: &'a str, label: &str) -> Cow<'a, [u8]> {
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(encoding) => {
            let (bytes, _, _) = encoding.encode(text);
            bytes
        }
        None => Cow::Borrowed(text.as_bytes()),
    }
}

/// Extract encoding from XML declaration.
///
/// Only the first 100 bytes are inspected.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    if after_enc.is_empty() {
        return None;
    }

    let quote = after_enc[0];
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = after_enc[1..].iter().position(|&b| b == quote)? + 1;

    std::str::from_utf8(&after_enc[1..value_end]).ok()
}

/// Resolve a `src` reference: relative to `base_dir` first, then as given.
pub fn resolve_source(base_dir: &Path, src: &str) -> Option<PathBuf> {
    let relative = base_dir.join(src);
    if relative.is_file() {
        return Some(relative);
    }
    let direct = PathBuf::from(src);
    direct.is_file().then_some(direct)
}

/// True for hrefs that point outside the local file tree.
pub fn is_external_href(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with('/')
        || href.contains("://")
        || href.starts_with("mailto:")
        || href.starts_with("data:")
}

/// Guess a manifest media type from a file extension.
pub fn media_type(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    let ext = lower.rsplit('.').next().unwrap_or("");
    match ext {
        "xhtml" | "html" | "htm" => "application/xhtml+xml",
        "css" => "text/css",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF<songbook/>";
        assert_eq!(decode_text(bytes, None), "<songbook/>");
    }

    #[test]
    fn test_decode_latin2_hint() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"iso-8859-2\"?><t>\xb3</t>";
        assert_eq!(extract_xml_encoding(bytes), Some("iso-8859-2"));
        assert!(decode_xml(bytes).contains('ł'));
    }

    #[test]
    fn test_encode_unknown_label_is_utf8() {
        assert_eq!(&*encode_text("ł", "no-such-encoding"), "ł".as_bytes());
        assert_eq!(&*encode_text("ł", "iso-8859-2"), &[0xb3]);
    }

    #[test]
    fn test_external_hrefs() {
        assert!(is_external_href("http://example.com/a.png"));
        assert!(is_external_href("#top"));
        assert!(is_external_href("mailto:someone@example.com"));
        assert!(!is_external_href("img/a.png"));
        assert!(!is_external_href("../style.css"));
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("img/a.PNG"), "image/png");
        assert_eq!(media_type("style.css"), "text/css");
        assert_eq!(media_type("text/sng_a.xhtml"), "application/xhtml+xml");
        assert_eq!(media_type("unknown"), "application/octet-stream");
    }
}
