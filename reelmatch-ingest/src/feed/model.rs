//! Feed title entries
//!
//! A `TitleEntry` is built fresh for every `<catalog_title>` element, consumed
//! once by the extractor, then dropped.

/// One decoded `<catalog_title>` element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleEntry {
    /// Resource URL, e.g. `http://api.netflix.com/catalog/titles/movies/42`
    pub id: String,
    pub release_year: i32,
    pub title: TitleName,
    pub updated: i64,
    pub rating: f32,
    /// Links in document order
    pub links: Vec<Link>,
}

/// Short and regular display forms of a title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleName {
    pub short: String,
    pub regular: String,
}

/// A `<link>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    /// Relation tag identifying the link's role
    pub rel: String,
    pub href: String,
    /// Text of a nested `<synopsis>` element
    pub synopsis: Option<String>,
    /// Links of a nested `<box_art>` collection
    pub box_art: Option<Vec<Link>>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            ..Self::default()
        }
    }
}
