//! Symmetric "see also" links between songs.
//!
//! Each pass looks at every `<link>` below a song: links naming a title no
//! song carries are dropped, and every song a link names receives a link
//! back unless it already has one. Passes repeat until nothing is created.

use log::{debug, info, warn};

use crate::tree::{Node, NodeId, NodeKind, Songbook};

/// Counts from one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub passes: usize,
    pub created: usize,
    pub removed: usize,
}

/// Make the link relation symmetric and free of dead links.
pub fn reconcile_links(book: &mut Songbook) -> LinkReport {
    let song_count = book.songs().len();
    let max_passes = song_count * song_count + 1;
    let mut report = LinkReport::default();

    loop {
        report.passes += 1;

        let mut creations: Vec<(NodeId, String)> = Vec::new();
        let mut removals: Vec<NodeId> = Vec::new();

        for link in song_links(book) {
            let Some(from) = book.parent(link) else {
                continue;
            };
            let title_from = book.title(from).to_string();
            let title_to = book.title(link);

            let targets = book.songs_titled(title_to);
            if targets.is_empty() {
                info!("Removing dead link '{title_to}' from '{title_from}'");
                removals.push(link);
                continue;
            }
            for target in targets {
                if !book.has_link_to(target, &title_from) {
                    creations.push((target, title_from.clone()));
                }
            }
        }

        let mut created = 0;
        for (target, title) in creations {
            // Several links in one pass may ask for the same reciprocal.
            if book.has_link_to(target, &title) {
                continue;
            }
            debug!("Adding link '{title}' to '{}'", book.title(target));
            append_link(book, target, &title);
            created += 1;
        }
        for link in &removals {
            book.detach(*link);
        }

        report.created += created;
        report.removed += removals.len();

        if created == 0 {
            break;
        }
        if report.passes >= max_passes {
            warn!("Link reconciliation stopped after {} passes", report.passes);
            break;
        }
    }

    report
}

/// Every titled `<link>` whose parent is a song, in document order.
fn song_links(book: &Songbook) -> Vec<NodeId> {
    book.find_all(|n| n.kind == NodeKind::Link && n.attrs.contains("title"))
        .into_iter()
        .filter(|&id| {
            book.parent(id)
                .is_some_and(|p| book.kind(p) == Some(NodeKind::Song))
        })
        .collect()
}

/// Add a link after the song's last existing link, or at the end.
fn append_link(book: &mut Songbook, song: NodeId, title: &str) -> NodeId {
    let last_link = book
        .children(song)
        .filter(|&c| book.kind(c) == Some(NodeKind::Link))
        .last();
    let link = book.alloc(Node::new(NodeKind::Link).with_attr("title", title));
    match last_link {
        Some(last) => book.insert_after(last, link),
        None => book.append(song, link),
    }
    link
}
