//! Record extraction
//!
//! Derives the persisted fields of a title from its decoded entry. Relation
//! tags are compared by exact string equality; unknown tags are ignored.

use super::model::TitleEntry;
use crate::IngestError;
use reelmatch_common::db::StoredTitleRecord;
use reqwest::Url;

/// Relation tag of the playback link
pub const REL_PLAY: &str = "alternate";

/// Relation tag of the link carrying the synopsis
pub const REL_SYNOPSIS: &str = "http://schemas.netflix.com/catalog/titles/synopsis";

/// Relation tag of the 197 pixel wide box art inside a `<box_art>` collection
pub const REL_BOX_ART_197: &str = "http://schemas.netflix.com/catalog/titles/box_art/197pix_w";

/// Path segment marking movie resources
const MOVIE_KIND: &str = "movies";

/// Resource kind named by the second-to-last identifier path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Movie,
    Other(String),
}

impl TitleEntry {
    /// Playback URL, or `""` when no link has the `alternate` relation
    pub fn play_url(&self) -> &str {
        self.links
            .iter()
            .find(|l| l.rel == REL_PLAY)
            .map(|l| l.href.as_str())
            .unwrap_or("")
    }

    /// Synopsis text, or `""`
    pub fn synopsis(&self) -> &str {
        self.links
            .iter()
            .find(|l| l.rel == REL_SYNOPSIS)
            .and_then(|l| l.synopsis.as_deref())
            .unwrap_or("")
    }

    /// Box art URL, or `""`
    ///
    /// Searches the nested collections of every top-level link in order; a
    /// link without a collection does not end the search.
    pub fn box_art(&self) -> &str {
        self.links
            .iter()
            .filter_map(|l| l.box_art.as_deref())
            .flatten()
            .find(|l| l.rel == REL_BOX_ART_197)
            .map(|l| l.href.as_str())
            .unwrap_or("")
    }

    /// Path segments of the identifier URL; at least two are required
    fn path_segments(&self) -> Result<Vec<String>, IngestError> {
        let url = Url::parse(&self.id).map_err(|e| self.malformed(e.to_string()))?;
        let segments: Vec<String> = url
            .path_segments()
            .ok_or_else(|| self.malformed("URL has no path"))?
            .map(str::to_string)
            .collect();

        if segments.len() < 2 {
            return Err(self.malformed(format!(
                "expected at least 2 path segments, found {}",
                segments.len()
            )));
        }
        Ok(segments)
    }

    /// Kind of resource this entry describes
    pub fn resource_kind(&self) -> Result<ResourceKind, IngestError> {
        let segments = self.path_segments()?;
        let kind = &segments[segments.len() - 2];
        if kind == MOVIE_KIND {
            Ok(ResourceKind::Movie)
        } else {
            Ok(ResourceKind::Other(kind.clone()))
        }
    }

    /// Numeric id from the last identifier path segment
    pub fn numeric_id(&self) -> Result<i64, IngestError> {
        let segments = self.path_segments()?;
        let last = &segments[segments.len() - 1];
        last.parse::<i64>()
            .map_err(|_| self.malformed(format!("last path segment {:?} is not an integer", last)))
    }

    /// Build the persisted record
    ///
    /// Returns `None` for entries without a playback URL; those are dropped
    /// rather than stored.
    pub fn to_record(&self) -> Result<Option<StoredTitleRecord>, IngestError> {
        let play_url = self.play_url();
        if play_url.is_empty() {
            return Ok(None);
        }

        Ok(Some(StoredTitleRecord {
            id: self.numeric_id()?,
            year: self.release_year,
            title: self.title.regular.clone(),
            updated: self.updated,
            rating: self.rating,
            play_url: play_url.to_string(),
            synopsis: self.synopsis().to_string(),
            box_art: self.box_art().to_string(),
        }))
    }

    fn malformed(&self, reason: impl Into<String>) -> IngestError {
        IngestError::MalformedIdentifier {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }
}
