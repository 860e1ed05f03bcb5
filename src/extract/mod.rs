//! Extraction strategies.
//!
//! Each strategy turns one page URL into an [`ExtractionResult`]. The
//! static recipes do a single HTTP round trip; the interception
//! strategy drives a real browser session.
//!
//! [`ExtractionResult`]: crate::model::ExtractionResult

pub mod intercept;
pub mod static_html;
