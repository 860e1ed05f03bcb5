//! Core data model: extraction results, quality labels, and the transient
//! candidates captured during network interception.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Title used when a page's title cannot be discovered.
pub const UNTITLED: &str = "Untitled";

/// Marker that forces the "HLS Playlist" label regardless of rank.
pub const HLS_MARKER: &str = ".m3u8";

/// One labeled media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quality {
    pub label: String,
    pub url: String,
}

/// The normalized output of every extraction strategy.
///
/// `qualities` keeps rank order; on the wire it serializes as a JSON
/// object (label → URL) so clients see `{"HLS Playlist": "...",
/// "Quality 2": "..."}` rather than an array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub title: String,
    #[serde(serialize_with = "qualities_as_map")]
    pub qualities: Vec<Quality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ExtractionResult {
    /// Whether the extraction actually found playable media.
    pub fn has_qualities(&self) -> bool {
        !self.qualities.is_empty()
    }
}

fn qualities_as_map<S: Serializer>(qualities: &[Quality], ser: S) -> Result<S::Ok, S::Error> {
    let mut map = ser.serialize_map(Some(qualities.len()))?;
    for q in qualities {
        map.serialize_entry(&q.label, &q.url)?;
    }
    map.end()
}

/// A network exchange that plausibly carries playable media.
///
/// Created only while an interception session is live; discarded after
/// ranking. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// Rank candidates by descending declared size and assign labels.
///
/// Takes the top `max` candidates. Any URL containing the HLS playlist
/// marker keeps the "HLS Playlist" label no matter where it ranks; the
/// rest are labeled "Quality 1", "Quality 2", ... by position.
pub fn rank_candidates(mut candidates: Vec<Candidate>, max: usize) -> Vec<Quality> {
    candidates.sort_by(|a, b| b.size.cmp(&a.size));
    candidates
        .into_iter()
        .take(max)
        .enumerate()
        .map(|(i, c)| {
            let label = if c.url.contains(HLS_MARKER) {
                "HLS Playlist".to_string()
            } else {
                format!("Quality {}", i + 1)
            };
            Quality { label, url: c.url }
        })
        .collect()
}
