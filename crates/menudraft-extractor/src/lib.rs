//! menudraft Extractor
//!
//! Turns an uploaded menu into a [`Draft`](menudraft_domain::Draft).
//!
//! # Overview
//!
//! Two extraction paths share one output shape:
//!
//! - **Heuristic path** ([`extract_from_text`]): local and deterministic.
//!   Classifies plain-text lines into section headers and items, then runs
//!   keyword/regex detectors for service type, head count, start time and
//!   service format. Never fails.
//! - **AI path** ([`AiExtractor`]): base64-encodes the document and asks a
//!   generative model for a JSON draft. A response that cannot be parsed
//!   degrades to the placeholder draft instead of failing; transport errors
//!   are returned to the caller.
//!
//! # Architecture
//!
//! ```text
//! text/*          → heuristic → Draft
//! image/*, pdf    → AiExtractor → LLM → parser → Draft | placeholder Draft
//! ```
//!
//! # Example Usage
//!
//! ```
//! use menudraft_extractor::extract_from_text;
//! use menudraft_domain::ServiceType;
//!
//! let draft = extract_from_text("CENA:\nSopa\nPescado");
//! let service = &draft.detected_services[0];
//! assert_eq!(service.service_type, ServiceType::Dinner);
//! assert_eq!(service.sections[0].title, "CENA");
//! assert_eq!(service.sections[0].items, vec!["Sopa", "Pescado"]);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod heuristic;
mod parser;
mod prompt;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::AiExtractor;
pub use heuristic::{
    detect_format, detect_pax, detect_service_type, detect_start, extract_from_text,
    is_section_header, DEFAULT_SECTION_TITLE,
};
pub use parser::strip_code_fences;
