//! Deterministic merge of internal and external entries.

use crate::types::DirectoryEntry;

/// Which audience a merged view is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryView {
    /// Active entries only.
    Public,
    /// Every entry, active or not; rows keep their `source` tag.
    Admin,
}

/// Concatenate both sources and order by `sort_order`, then `title`.
///
/// The sort is stable, so entries equal on both keys keep concatenation order
/// (internal before external) and identical inputs always give identical output.
pub fn merge(
    internal: Vec<DirectoryEntry>,
    external: Vec<DirectoryEntry>,
    view: DirectoryView,
) -> Vec<DirectoryEntry> {
    let mut entries: Vec<DirectoryEntry> = internal.into_iter().chain(external).collect();
    if view == DirectoryView::Public {
        entries.retain(|entry| entry.is_active);
    }
    sort_entries(&mut entries);
    entries
}

pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.title.cmp(&b.title))
    });
}
