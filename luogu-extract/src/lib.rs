//! Normalization of Luogu responses into article, paste, judgement log and
//! user profile records.
//!
//! The service answers with decoded JSON, JSON wrapped in a string, or a full
//! HTML page carrying a `lentille` hydration payload. [`ResponseClassifier`]
//! picks the extraction strategy for the requested [`ResponseKind`] and hands
//! markup to [`EmbeddedPayloadExtractor`] when the payload lives in the page.
pub mod author;
pub mod classifier;
pub mod logs;
pub mod markup;
pub mod response;

pub use author::{AuthorInfo, normalize_author};
pub use classifier::ResponseClassifier;
pub use logs::LogCollection;
pub use markup::EmbeddedPayloadExtractor;
pub use response::{ExtractedValue, RawResponse, ResponseKind, UnknownKind};

pub use luogu_common::{Result, StructureError};
