// Merged edge stream - remote rows first, then the overlay snapshot

use crate::session::{EdgeProjection, ResultHandle, Session};
use futures::{Stream, StreamExt};
use graphlink_common::{Edge, ElementId, Result};
use std::collections::{BTreeSet, HashSet};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

/// Owns the remote cursor and releases it exactly once: on exhaustion, on
/// the first failed row, or when dropped.
pub(crate) struct RemoteEdges {
    cursor: Option<ResultHandle>,
    session: Arc<dyn Session>,
    projection: EdgeProjection,
}

impl RemoteEdges {
    pub(crate) fn new(cursor: ResultHandle, session: Arc<dyn Session>, projection: EdgeProjection) -> Self {
        Self {
            cursor: Some(cursor),
            session,
            projection,
        }
    }

    fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.consume();
            tracing::debug!("Released remote edge cursor");
        }
    }

    fn poll_edge(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Edge>>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Poll::Ready(None);
        };

        let item = match ready!(cursor.poll_next_unpin(cx)) {
            Some(Ok(record)) => self.session.edge_from_record(&record, &self.projection),
            Some(Err(err)) => Err(err),
            None => {
                self.release();
                return Poll::Ready(None);
            }
        };

        if item.is_err() {
            self.release();
        }
        Poll::Ready(Some(item))
    }
}

impl Drop for RemoteEdges {
    fn drop(&mut self) {
        self.release();
    }
}

/// Finite, single-pass stream of a vertex's edges. No identifier is yielded
/// twice.
///
/// After the first `Err` the stream is finished and the overlay portion is
/// never produced.
pub struct EdgeStream {
    remote: Option<RemoteEdges>,
    excluded: HashSet<ElementId>,
    seen: HashSet<ElementId>,
    local: std::vec::IntoIter<Edge>,
    failed: bool,
}

impl EdgeStream {
    /// Stream over overlay edges only.
    pub(crate) fn local_only(local: Vec<Edge>) -> Self {
        Self {
            remote: None,
            excluded: HashSet::new(),
            seen: HashSet::new(),
            local: local.into_iter(),
            failed: false,
        }
    }

    /// Remote rows whose identifier is in `excluded` are dropped; `local` is
    /// emitted once the remote side is exhausted.
    pub(crate) fn merged(remote: RemoteEdges, excluded: BTreeSet<ElementId>, local: Vec<Edge>) -> Self {
        Self {
            remote: Some(remote),
            excluded: excluded.into_iter().collect(),
            seen: HashSet::new(),
            local: local.into_iter(),
            failed: false,
        }
    }

    /// Whether the remote cursor is still open.
    pub fn is_fetching(&self) -> bool {
        self.remote
            .as_ref()
            .map(|remote| remote.cursor.is_some())
            .unwrap_or(false)
    }
}

impl Stream for EdgeStream {
    type Item = Result<Edge>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Ready(None);
        }

        while let Some(remote) = this.remote.as_mut() {
            match ready!(remote.poll_edge(cx)) {
                Some(Ok(edge)) => {
                    if this.excluded.contains(&edge.id) || !this.seen.insert(edge.id.clone()) {
                        tracing::trace!(edge = %edge.id, "Skipping duplicate remote edge");
                        continue;
                    }
                    return Poll::Ready(Some(Ok(edge)));
                }
                Some(Err(err)) => {
                    this.remote = None;
                    this.failed = true;
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.remote = None;
                }
            }
        }

        Poll::Ready(this.local.next().map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let local = self.local.len();
        if self.remote.is_some() {
            (local, None)
        } else {
            (local, Some(local))
        }
    }
}

impl std::fmt::Debug for EdgeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeStream")
            .field("fetching", &self.is_fetching())
            .field("excluded", &self.excluded.len())
            .field("yielded_remote", &self.seen.len())
            .field("local_remaining", &self.local.len())
            .field("failed", &self.failed)
            .finish()
    }
}
