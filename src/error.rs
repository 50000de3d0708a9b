//! Error types for fetching, parsing, configuration and serialization
//!
//! Per-URL failures ([`FetchError`], [`ParseError`]) never escape a pipeline run;
//! they are rendered into the affected record instead. Only [`ConfigError`] and
//! [`RunError`] are surfaced as a failed run.

/// Errors that can occur while fetching a single URL
///
/// The display text of this error is what ends up in the record of a failed URL,
/// prefixed with `"Error: "`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or no response was received
    ///
    /// Covers invalid URLs, DNS failures, refused connections and timeouts.
    #[error("{message}")]
    Transport { message: String },

    /// The server answered with a non-success status code
    #[error("{status} {class}: {reason} for url: {url}", class = status_class(.status))]
    Status {
        status: u16,
        reason: String,
        url: String,
    },

    /// The response body could not be read
    #[error("Failed to read response body: {message}")]
    Body { message: String },
}

fn status_class(status: &u16) -> &'static str {
    match *status {
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Error",
    }
}

/// Errors that can occur when turning a fetched body into a parsed document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The response declared a binary media type that cannot hold HTML
    #[error("Unsupported content type '{content_type}'")]
    UnsupportedContentType { content_type: String },
}

/// Errors in the run configuration, detected before any network activity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The field specification contained no usable tokens
    #[error("No fields to extract were specified")]
    NoFields,

    /// A token is neither `title`, a tag name, nor an `attribute="value"` pair
    ///
    /// A meta token missing its `=` separator ends up here too.
    #[error("Invalid tag name '{0}': expected letters, digits or '-', starting with a letter")]
    InvalidTagName(String),

    /// A meta token has an empty attribute name
    #[error("Invalid meta token '{0}': expected attribute=\"value\"")]
    InvalidMetaToken(String),

    /// Two fields would produce the same column
    #[error("Field '{0}' is specified more than once")]
    DuplicateField(String),

    /// A field would collide with the URL column
    #[error("Field key '{0}' is reserved for the URL column")]
    ReservedKey(String),

    /// Worker concurrency must be greater than 0
    #[error("Concurrency must be greater than 0, got {0}")]
    InvalidConcurrency(usize),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors that abort a whole extraction run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// There was nothing to process
    #[error("The URL list is empty")]
    NoUrls,

    /// The field specification is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors reported by the output writers
///
/// Records produced by a pipeline run only hold plain strings, so these only
/// surface on writer-internal failures.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    /// Failed to write CSV output
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to encode JSON output
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to build the spreadsheet
    #[error("Spreadsheet output failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Failed to flush an in-memory buffer
    #[error("Output buffer failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading a URL list
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The file could not be read
    #[error("Failed to read URL list: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV file could not be parsed
    #[error("Failed to parse URL list: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook could not be opened or its first sheet read
    #[error("Failed to read URL workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    /// The header row has no column with the requested name
    #[error("Column '{0}' not found in the URL list")]
    MissingColumn(String),
}
