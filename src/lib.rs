// Core modules
mod document;
mod error;
mod extract;
mod fetch;
mod field;
pub mod input;
mod output;
pub mod pipeline;
mod record;

// Public exports
pub use document::{HtmlDocument, RawDocument};
pub use error::{ConfigError, FetchError, InputError, ParseError, RunError, SerializeError};
pub use extract::{FieldExtractor, collapse_whitespace};
pub use fetch::{HttpFetcher, HttpFetcherBuilder, UrlFetcher};
pub use field::{FieldSet, FieldSpec, TITLE_KEY, URL_KEY};
pub use output::{OutputFormat, ResultSerializer};
pub use pipeline::{
    ExtractionPipeline, ObserverRegistry, PipelineBuilder, PipelineConfig, PipelineObserver,
    ProgressCallback, ProgressEvent, RunStats, StatsTracker,
};
pub use record::{ERROR_PREFIX, Record, RunResult};
