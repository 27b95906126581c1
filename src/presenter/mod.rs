//! Pure text rendering: lists, single items, download status.
//!
//! Messages that a later button has to resolve carry their state in the text itself:
//! list pages end with a `page <n>/<total>` footer and item messages carry a
//! `MovieId: <id>` or `SerieId: <id>` line.

pub mod media;
pub mod pagination;
pub mod status;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{MediaItem, MediaKind};

pub use pagination::{page_footer, paginate, parse_page_footer, with_footer, PageNav};

static ID_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:<i>)?(MovieId|SerieId):\s*(\d+)\s*(?:</i>)?\s*$").expect("valid id line regex")
});

pub fn id_line(kind: MediaKind, id: i64) -> String {
    format!("<i>{}: {}</i>", kind.id_label(), id)
}

/// Finds the identifier line for `kind`, with or without its markup.
pub fn parse_embedded_id(kind: MediaKind, text: &str) -> Option<i64> {
    ID_LINE
        .captures_iter(text)
        .filter(|c| &c[1] == kind.id_label())
        .find_map(|c| c[2].parse().ok())
}

/// Library list split into pages; the header counts the whole library.
pub fn list_pages(kind: MediaKind, items: &[MediaItem], budget: usize) -> Vec<String> {
    let mut entries = Vec::with_capacity(items.len() + 1);
    entries.push(media::list_header(kind, items.len()));
    entries.extend(items.iter().map(media::list_entry));
    paginate(&entries, budget)
}
