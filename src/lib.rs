//! quarry — multi-strategy media extraction service.
//!
//! Resolves a media page URL into a canonical title plus ranked
//! playable-media URLs, picking the cheapest extraction strategy the
//! source site allows: static HTML parsing when the metadata is in the
//! markup, full browser-session network interception when it is not.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod registry;
pub mod rest;
