//! Streaming feed decoder
//!
//! Walks the catalog document token by token and only materializes one
//! `<catalog_title>` subtree at a time, so memory use is bounded by the
//! largest single title rather than the feed.
//!
//! Expected element shape (unknown elements and attributes are ignored):
//!
//! ```xml
//! <catalog_title>
//!   <id>http://api.netflix.com/catalog/titles/movies/42</id>
//!   <title short="X" regular="X: The Movie"/>
//!   <release_year>2001</release_year>
//!   <updated>1300000000</updated>
//!   <average_rating>4.5</average_rating>
//!   <link rel="alternate" href="http://play/42"/>
//!   <link rel="http://schemas.netflix.com/catalog/titles/synopsis" href="...">
//!     <synopsis>...</synopsis>
//!   </link>
//!   <link rel="http://schemas.netflix.com/catalog/titles/box_art" href="...">
//!     <box_art>
//!       <link rel="http://schemas.netflix.com/catalog/titles/box_art/197pix_w" href="..."/>
//!     </box_art>
//!   </link>
//! </catalog_title>
//! ```

use super::extract::ResourceKind;
use super::model::{Link, TitleEntry, TitleName};
use crate::IngestError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reelmatch_common::db::StoredTitleRecord;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Local name of the per-title element
pub const TITLE_ELEMENT: &[u8] = b"catalog_title";

/// Counters for one decoding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Title elements decoded into entries
    pub decoded: u64,
    /// Records handed to the work queue
    pub queued: u64,
    /// Elements skipped because a field failed to convert
    pub invalid: u64,
    /// Entries describing something other than a movie
    pub non_movie: u64,
    /// Movie entries without a playback URL
    pub unplayable: u64,
}

/// A field value that could not be converted; the element is skipped
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {field} value {value:?}")]
pub struct InvalidField {
    pub field: &'static str,
    pub value: String,
}

/// Decode the feed and queue one record per playable movie
///
/// The source is owned and dropped (closed) on every exit path. Sending waits
/// for queue capacity, which is how a slow writer pool throttles decoding.
/// Returns `IngestError::Cancelled` when `cancel` fires or every writer is
/// gone.
pub async fn decode_feed<R>(
    source: R,
    queue: mpsc::Sender<StoredTitleRecord>,
    cancel: CancellationToken,
) -> Result<DecodeStats, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    // Text is kept untrimmed: a synopsis may mix text and CDATA pieces whose
    // separating whitespace must survive. Fields are trimmed once complete.
    let mut reader = Reader::from_reader(source);

    let mut buf = Vec::new();
    let mut element_buf = Vec::new();
    let mut stats = DecodeStats::default();

    loop {
        buf.clear();
        let at_title = match reader.read_event_into_async(&mut buf).await {
            Ok(Event::Start(e)) => e.local_name().as_ref() == TITLE_ELEMENT,
            Ok(Event::Eof) => break,
            Ok(_) => false,
            Err(e) => {
                error!(
                    position = reader.buffer_position(),
                    "Feed token stream failed: {}", e
                );
                return Err(e.into());
            }
        };
        if !at_title {
            continue;
        }

        // A fresh builder per element: nothing carries over between titles.
        // Syntax errors inside the element are fatal: the reader cannot tell
        // where this element ends, so there is no next title to resume at.
        let raw = decode_title(&mut reader, &mut element_buf).await?;
        let entry = match raw.into_entry() {
            Ok(entry) => entry,
            Err(e) => {
                warn!(position = reader.buffer_position(), "Skipping title element: {}", e);
                stats.invalid += 1;
                continue;
            }
        };
        stats.decoded += 1;

        if let ResourceKind::Other(kind) = entry.resource_kind()? {
            debug!(id = %entry.id, kind = %kind, "Skipping non-movie title");
            stats.non_movie += 1;
            continue;
        }

        let Some(record) = entry.to_record()? else {
            debug!(id = %entry.id, "Skipping movie without playback URL");
            stats.unplayable += 1;
            continue;
        };

        let title_id = record.id;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Decoding cancelled after {} queued titles", stats.queued);
                return Err(IngestError::Cancelled);
            }
            sent = queue.send(record) => {
                if sent.is_err() {
                    warn!("Work queue closed, all writers stopped");
                    return Err(IngestError::Cancelled);
                }
            }
        }
        debug!(title_id, "Queued title");
        stats.queued += 1;
    }

    info!(
        decoded = stats.decoded,
        queued = stats.queued,
        invalid = stats.invalid,
        non_movie = stats.non_movie,
        unplayable = stats.unplayable,
        "Feed decoded"
    );
    Ok(stats)
}

/// Consume the rest of a `<catalog_title>` element
///
/// Call right after its start tag was read. Token stream failures are fatal;
/// field problems are recorded on the returned builder.
async fn decode_title<R>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
) -> Result<RawTitle, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = RawTitle::default();
    // Open elements below <catalog_title>
    let mut path: Vec<String> = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into_async(buf).await? {
            Event::Start(e) => {
                raw.open(&path, &e);
                path.push(local_name(&e));
            }
            Event::Empty(e) => raw.open(&path, &e),
            Event::Text(t) => match t.unescape() {
                Ok(text) => raw.text(&path, &text),
                Err(_) => raw.invalid("text", String::from_utf8_lossy(&t).into_owned()),
            },
            Event::CData(t) => raw.text(&path, &String::from_utf8_lossy(&t)),
            Event::End(_) => {
                if path.pop().is_none() {
                    return Ok(raw);
                }
            }
            Event::Eof => return Err(IngestError::TruncatedFeed),
            _ => {}
        }
    }
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

/// Raw field text collected while walking one title element
#[derive(Debug, Default)]
struct RawTitle {
    id: String,
    release_year: String,
    updated: String,
    average_rating: String,
    title: TitleName,
    links: Vec<Link>,
    /// First conversion problem seen; reported after the element is consumed
    problem: Option<InvalidField>,
}

impl RawTitle {
    fn open(&mut self, parent: &[String], element: &BytesStart<'_>) {
        let parent: Vec<&str> = parent.iter().map(String::as_str).collect();
        let name = local_name(element);

        match (parent.as_slice(), name.as_str()) {
            ([], "title") => {
                self.title.short = self.attribute(element, b"short");
                self.title.regular = self.attribute(element, b"regular");
            }
            ([], "link") => {
                let link = self.link(element);
                self.links.push(link);
            }
            (["link"], "box_art") => {
                if let Some(link) = self.links.last_mut() {
                    link.box_art.get_or_insert_with(Vec::new);
                }
            }
            (["link", "box_art"], "link") => {
                let nested = self.link(element);
                if let Some(link) = self.links.last_mut() {
                    link.box_art.get_or_insert_with(Vec::new).push(nested);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, path: &[String], text: &str) {
        let path: Vec<&str> = path.iter().map(String::as_str).collect();

        let target = match path.as_slice() {
            ["id"] => &mut self.id,
            ["release_year"] => &mut self.release_year,
            ["updated"] => &mut self.updated,
            ["average_rating"] => &mut self.average_rating,
            ["link", "synopsis"] => match self.links.last_mut() {
                Some(link) => link.synopsis.get_or_insert_with(String::new),
                None => return,
            },
            _ => return,
        };
        target.push_str(text);
    }

    fn link(&mut self, element: &BytesStart<'_>) -> Link {
        Link::new(
            self.attribute(element, b"rel"),
            self.attribute(element, b"href"),
        )
    }

    /// Unescaped attribute value, `""` when absent
    fn attribute(&mut self, element: &BytesStart<'_>, key: &[u8]) -> String {
        for attr in element.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(e) => {
                    self.invalid("attribute", e.to_string());
                    return String::new();
                }
            };
            if attr.key.local_name().as_ref() != key {
                continue;
            }
            return match attr.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => {
                    self.invalid("attribute", String::from_utf8_lossy(&attr.value).into_owned());
                    String::new()
                }
            };
        }
        String::new()
    }

    fn invalid(&mut self, field: &'static str, value: String) {
        self.problem.get_or_insert(InvalidField { field, value });
    }

    fn into_entry(self) -> Result<TitleEntry, InvalidField> {
        if let Some(problem) = self.problem {
            return Err(problem);
        }

        let mut links = self.links;
        for synopsis in links.iter_mut().filter_map(|l| l.synopsis.as_mut()) {
            *synopsis = synopsis.trim().to_string();
        }

        Ok(TitleEntry {
            id: self.id.trim().to_string(),
            release_year: parse_field("release_year", &self.release_year)?,
            title: self.title,
            updated: parse_field("updated", &self.updated)?,
            rating: parse_field("average_rating", &self.average_rating)?,
            links,
        })
    }
}

/// Parse a numeric field; an absent element reads as zero
fn parse_field<T>(field: &'static str, value: &str) -> Result<T, InvalidField>
where
    T: std::str::FromStr + Default,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(T::default());
    }
    value.parse().map_err(|_| InvalidField {
        field,
        value: value.to_string(),
    })
}
