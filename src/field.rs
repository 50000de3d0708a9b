//! Field specifications
//!
//! A [`FieldSpec`] describes one value to pull out of a page. The ordered,
//! validated list of specs for a run is a [`FieldSet`], usually parsed from a
//! comma-separated string such as `title,h1,p,name="description"`.

use std::{collections::HashSet, fmt, str::FromStr};

use crate::ConfigError;

/// Key of the column holding the URL in every record
pub const URL_KEY: &str = "URL";

/// Key used by the title field
pub const TITLE_KEY: &str = "title";

/// One value to extract from a parsed document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    /// The document title, falling back to `<meta name="title">`
    Title,
    /// Text of all `tag_name` elements inside `<main>`, `<article>` or `<section>`
    Selector { tag_name: String },
    /// The `content` of the first `<meta>` whose `attribute` equals `value`
    Meta { attribute: String, value: String },
}

impl FieldSpec {
    /// Create a selector field for the given tag name, lowercased
    pub fn selector(tag_name: impl Into<String>) -> Self {
        Self::Selector {
            tag_name: tag_name.into().to_ascii_lowercase(),
        }
    }

    /// Create a meta field matching `<meta attribute="value">`
    ///
    /// The attribute name is lowercased; the value is matched as given.
    pub fn meta(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Meta {
            attribute: attribute.into().to_ascii_lowercase(),
            value: value.into(),
        }
    }

    /// The column name this field produces in a record
    ///
    /// A selector for the `title` tag shares the title field's key since it is
    /// extracted with the title rule. Tag and attribute names are matched
    /// case-insensitively, so they appear lowercased here.
    pub fn key(&self) -> String {
        match self {
            Self::Title => TITLE_KEY.to_string(),
            Self::Selector { tag_name } if tag_name.eq_ignore_ascii_case(TITLE_KEY) => {
                TITLE_KEY.to_string()
            }
            Self::Selector { tag_name } => tag_name.to_ascii_lowercase(),
            Self::Meta { attribute, value } => {
                format!("{}=\"{value}\"", attribute.to_ascii_lowercase())
            }
        }
    }

    /// Parse a single token of a field specification string
    ///
    /// - `title` becomes [`FieldSpec::Title`]
    /// - `attribute="value"` becomes [`FieldSpec::Meta`], split at the first `=`
    /// - anything else must be a bare tag name
    pub fn parse_token(token: &str) -> Result<Self, ConfigError> {
        let token = token.trim();

        if let Some((attribute, value)) = token.split_once('=') {
            let attribute = attribute.trim().to_ascii_lowercase();
            if !is_valid_attribute_name(&attribute) {
                return Err(ConfigError::InvalidMetaToken(token.to_string()));
            }
            return Ok(Self::meta(attribute, strip_quotes(value.trim())));
        }

        if token.eq_ignore_ascii_case(TITLE_KEY) {
            return Ok(Self::Title);
        }

        let tag_name = token.to_ascii_lowercase();
        if !is_valid_tag_name(&tag_name) {
            return Err(ConfigError::InvalidTagName(token.to_string()));
        }
        Ok(Self::Selector { tag_name })
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn is_valid_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// HTML attribute names: no whitespace, quotes, `>`, `/` or `=`
fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '=')
        })
}

/// Split on commas that are not inside double quotes
fn split_tokens(input: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                tokens.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    tokens.push(&input[start..]);
    tokens
}

/// An ordered, validated sequence of field specifications
///
/// Every record of a run has the `URL` column followed by one column per field,
/// in this order. A `FieldSet` guarantees those columns are distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<FieldSpec>,
}

impl FieldSet {
    /// Validate a list of field specifications
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, ConfigError> {
        if fields.is_empty() {
            return Err(ConfigError::NoFields);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            match field {
                FieldSpec::Selector { tag_name }
                    if !is_valid_tag_name(&tag_name.to_ascii_lowercase()) =>
                {
                    return Err(ConfigError::InvalidTagName(tag_name.clone()));
                }
                FieldSpec::Meta { attribute, .. } if !is_valid_attribute_name(attribute) => {
                    return Err(ConfigError::InvalidMetaToken(field.key()));
                }
                _ => {}
            }

            let key = field.key();
            if key.eq_ignore_ascii_case(URL_KEY) {
                return Err(ConfigError::ReservedKey(key));
            }
            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateField(key));
            }
        }

        Ok(Self { fields })
    }

    /// The fields in extraction order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Column names of a record, starting with `URL`
    pub fn keys(&self) -> Vec<String> {
        std::iter::once(URL_KEY.to_string())
            .chain(self.fields.iter().map(FieldSpec::key))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.fields.iter()
    }

    /// Append the fields of `other` whose keys are not already present
    ///
    /// Order is kept: this set's fields first, then the new ones from `other`.
    pub fn union(self, other: FieldSet) -> Result<Self, ConfigError> {
        let present: HashSet<String> = self.fields.iter().map(FieldSpec::key).collect();
        let mut fields = self.fields;
        fields.extend(
            other
                .fields
                .into_iter()
                .filter(|field| !present.contains(&field.key())),
        );
        Self::new(fields)
    }
}

impl FromStr for FieldSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = split_tokens(s)
            .into_iter()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(FieldSpec::parse_token)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(fields)
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
