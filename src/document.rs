//! Fetched payloads and their parsed HTML representation

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use scraper::{ElementRef, Html, Selector};

use crate::ParseError;

/// Media types that can never hold an HTML document
const BINARY_TYPES: &[&str] = &[
    "application/pdf",
    "application/octet-stream",
    "application/zip",
    "application/gzip",
];

const BINARY_PREFIXES: &[&str] = &["image/", "audio/", "video/", "font/"];

/// Leading bytes searched for a `<meta>` charset declaration
const CHARSET_SNIFF_LEN: usize = 1024;

/// A response body as received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// The URL the body was fetched from
    pub url: String,
    /// Raw body bytes
    pub body: Vec<u8>,
    /// The declared `Content-Type` header, if any
    pub content_type: Option<String>,
}

impl RawDocument {
    /// Create a document from a body and its declared content type
    pub fn new(
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            content_type,
        }
    }

    /// Create an HTML document, mostly useful for tests and fixtures
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(
            url,
            body.into().into_bytes(),
            Some("text/html; charset=utf-8".to_string()),
        )
    }

    /// The media type without parameters, lowercased
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// The `charset` parameter of the declared content type
    pub fn declared_charset(&self) -> Option<&str> {
        charset_param(self.content_type.as_deref()?)
    }

    /// The body decoded to text
    ///
    /// The encoding is taken from a byte order mark, then the content type's
    /// charset, then a `<meta charset>` or `http-equiv` declaration near the
    /// start of the body. UTF-8 is the default. Malformed sequences become
    /// U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        let encoding = self
            .declared_charset()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .or_else(|| meta_charset(&self.body))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text
    }
}

fn charset_param(value: &str) -> Option<&str> {
    value.split(';').find_map(|param| {
        let (name, label) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| label.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// Encoding declared by a `<meta>` element in the head of an HTML body
fn meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(CHARSET_SNIFF_LEN)];
    let head = Html::parse_document(&String::from_utf8_lossy(head));
    let selector = Selector::parse("meta[charset], meta[http-equiv]").ok()?;

    head.select(&selector).find_map(|meta| {
        let element = meta.value();
        let label = match element.attr("charset") {
            Some(charset) => charset.trim(),
            None if element
                .attr("http-equiv")
                .is_some_and(|value| value.trim().eq_ignore_ascii_case("content-type")) =>
            {
                charset_param(element.attr("content")?)?
            }
            None => return None,
        };
        // A page declaring UTF-16 in ASCII markup is not UTF-16
        Encoding::for_label(label.as_bytes()).map(Encoding::output_encoding)
    })
}

/// A parsed HTML document that can be queried with CSS selectors
///
/// Query methods never fail: an invalid selector behaves like a selector that
/// matches nothing.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a fetched document
    ///
    /// HTML parsing itself is permissive; this only fails when the response
    /// declares a binary media type. A missing content type is treated as HTML.
    /// See [`RawDocument::text`] for how the body is decoded.
    pub fn parse(raw: &RawDocument) -> Result<Self, ParseError> {
        if let Some(media_type) = raw.media_type()
            && (BINARY_TYPES.contains(&media_type.as_str())
                || BINARY_PREFIXES.iter().any(|prefix| media_type.starts_with(prefix)))
        {
            return Err(ParseError::UnsupportedContentType {
                content_type: media_type,
            });
        }

        Ok(Self::parse_str(&raw.text()))
    }

    /// Parse an HTML string
    pub fn parse_str(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Select the first element matching the CSS selector
    pub fn select_one(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.html.select(&selector).next()
    }

    /// Select all elements matching the CSS selector, in document order
    pub fn select_all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        self.html.select(&selector).collect()
    }

    /// Trimmed text of the first `<title>` element
    pub fn title(&self) -> Option<String> {
        self.select_one("title")
            .map(|element| text_of(&element).trim().to_string())
    }

    /// The `content` attribute of the first `<meta>` whose `attribute` equals `value`
    ///
    /// Attribute names are matched case-insensitively, values exactly.
    /// Returns `None` when no such element exists or it has no `content`.
    pub fn meta_content(&self, attribute: &str, value: &str) -> Option<&str> {
        let attribute = attribute.to_ascii_lowercase();
        self.select_all("meta")
            .into_iter()
            .find(|element| element.value().attr(&attribute) == Some(value))
            .and_then(|element| element.value().attr("content"))
    }
}

/// All text content of an element, including its descendants
pub fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect()
}
