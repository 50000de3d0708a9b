//! Field extraction rules
//!
//! [`FieldExtractor`] applies one [`FieldSpec`] to an [`HtmlDocument`]. Absence
//! of a match always yields an empty string, never an error.

use crate::{
    FieldSet, FieldSpec, HtmlDocument,
    document::text_of,
    field::TITLE_KEY,
};

/// Content regions searched by selector fields
const CONTENT_REGIONS: [&str; 3] = ["main", "article", "section"];

/// Applies field specifications to parsed documents
///
/// # Examples
///
/// ```
/// use extractly::{FieldExtractor, FieldSpec, HtmlDocument};
///
/// let doc = HtmlDocument::parse_str("<article><p>  a  </p><p>b</p></article>");
/// assert_eq!(FieldExtractor::extract(&doc, &FieldSpec::selector("p")), "a b");
/// ```
pub struct FieldExtractor;

impl FieldExtractor {
    /// Extract the value of a single field
    pub fn extract(doc: &HtmlDocument, spec: &FieldSpec) -> String {
        match spec {
            FieldSpec::Title => Self::title(doc),
            FieldSpec::Selector { tag_name } if tag_name.eq_ignore_ascii_case(TITLE_KEY) => {
                Self::title(doc)
            }
            FieldSpec::Selector { tag_name } => Self::content_text(doc, tag_name),
            FieldSpec::Meta { attribute, value } => doc
                .meta_content(attribute, value)
                .map(collapse_whitespace)
                .unwrap_or_default(),
        }
    }

    /// Extract every field of a set, in set order, paired with its key
    pub fn extract_all(doc: &HtmlDocument, fields: &FieldSet) -> Vec<(String, String)> {
        fields
            .iter()
            .map(|spec| (spec.key(), Self::extract(doc, spec)))
            .collect()
    }

    /// `<title>` text, or `<meta name="title">` content when the title is missing or blank
    fn title(doc: &HtmlDocument) -> String {
        doc.title()
            .filter(|title| !title.is_empty())
            .or_else(|| {
                doc.meta_content("name", TITLE_KEY)
                    .map(|content| content.trim().to_string())
            })
            .unwrap_or_default()
    }

    /// Joined text of `tag_name` elements nested in any content region
    fn content_text(doc: &HtmlDocument, tag_name: &str) -> String {
        let tag_name = tag_name.to_ascii_lowercase();
        let selector = CONTENT_REGIONS
            .iter()
            .map(|region| format!("{region} {tag_name}"))
            .collect::<Vec<_>>()
            .join(", ");

        let joined = doc
            .select_all(&selector)
            .iter()
            .map(|element| text_of(element).trim().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        collapse_whitespace(&joined)
    }
}

/// Collapse every whitespace run to a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
