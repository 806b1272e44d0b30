//! Local copy of stream statuses built from socket frames.

use restream_types::{StatusFrame, StatusPayload, StreamKey};
use std::collections::HashMap;

/// One visible change produced by applying a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub stream_key: StreamKey,
    pub is_live: bool,
    pub viewers: u32,
    /// `(is_live, viewers)` before the change, `None` for a newly seen stream
    pub previous: Option<(bool, u32)>,
}

#[derive(Debug, Default)]
pub struct StatusView {
    statuses: HashMap<StreamKey, StatusPayload>,
    only: Option<StreamKey>,
}

impl StatusView {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view that ignores every stream except `key`.
    pub fn only(key: impl Into<StreamKey>) -> Self {
        Self {
            statuses: HashMap::new(),
            only: Some(key.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StatusPayload> {
        self.statuses.get(key)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Fold a frame into the view and return what actually changed.
    ///
    /// A snapshot replaces the view: streams missing from it are dropped.
    /// Frames that repeat the stored liveness and viewer count change nothing.
    pub fn apply(&mut self, frame: StatusFrame) -> Vec<StatusChange> {
        match frame {
            StatusFrame::InitialStatuses { statuses } => {
                let mut previous = std::mem::take(&mut self.statuses);
                let mut changes = Vec::new();
                for status in statuses {
                    if !self.wants(&status.stream_key) {
                        continue;
                    }
                    let before = previous.remove(status.stream_key.as_str());
                    if let Some(change) = Self::change(before.as_ref(), &status) {
                        changes.push(change);
                    }
                    self.statuses.insert(status.stream_key.clone(), status);
                }
                changes
            }
            StatusFrame::StreamStatus(status) => {
                if !self.wants(&status.stream_key) {
                    return Vec::new();
                }
                let change = Self::change(self.statuses.get(status.stream_key.as_str()), &status);
                self.statuses.insert(status.stream_key.clone(), status);
                change.into_iter().collect()
            }
        }
    }

    fn wants(&self, key: &StreamKey) -> bool {
        self.only.as_ref().is_none_or(|only| only == key)
    }

    fn change(before: Option<&StatusPayload>, after: &StatusPayload) -> Option<StatusChange> {
        let previous = before.map(|b| (b.is_live, b.viewers));
        if previous == Some((after.is_live, after.viewers)) {
            return None;
        }
        Some(StatusChange {
            stream_key: after.stream_key.clone(),
            is_live: after.is_live,
            viewers: after.viewers,
            previous,
        })
    }
}
