//! Accumulates uploaded photo resource ids until a reply claims them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

/// What a set of uploaded photos is grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Photos sent together as one album.
    MediaGroup(String),
    /// A single photo, keyed by its own message id.
    Message(i64),
}

impl GroupKey {
    /// Album id when present, otherwise the photo message itself.
    pub fn for_photo(media_group_id: Option<&str>, message_id: i64) -> Self {
        match media_group_id {
            Some(group) => GroupKey::MediaGroup(group.to_string()),
            None => GroupKey::Message(message_id),
        }
    }
}

/// Resource ids per (session, group), in upload order.
#[derive(Debug, Default)]
pub struct MediaGroups {
    groups: Mutex<HashMap<(String, GroupKey), Vec<i64>>>,
}

impl MediaGroups {
    pub fn new() -> Self {
        Self::default()
    }

    fn groups(&self) -> MutexGuard<'_, HashMap<(String, GroupKey), Vec<i64>>> {
        self.groups.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, session: &str, key: GroupKey, resource_id: i64) {
        let mut groups = self.groups();
        let ids = groups.entry((session.to_string(), key)).or_default();
        ids.push(resource_id);
        debug!(session, resource_id, group_size = ids.len(), "Recorded media group resource");
    }

    /// Ids recorded for the group, leaving them in place.
    pub fn peek(&self, session: &str, key: &GroupKey) -> Vec<i64> {
        self.groups()
            .get(&(session.to_string(), key.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Ids recorded for the group, removing the group.
    pub fn take(&self, session: &str, key: &GroupKey) -> Vec<i64> {
        self.groups()
            .remove(&(session.to_string(), key.clone()))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.groups().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_collects_in_order() {
        let groups = MediaGroups::new();
        let key = GroupKey::for_photo(Some("album-1"), 10);
        groups.record("chat", key.clone(), 5);
        groups.record("chat", GroupKey::for_photo(Some("album-1"), 11), 6);

        assert_eq!(groups.peek("chat", &key), vec![5, 6]);
        assert_eq!(groups.take("chat", &key), vec![5, 6]);
        assert!(groups.take("chat", &key).is_empty());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_single_photo_keyed_by_message() {
        let groups = MediaGroups::new();
        groups.record("chat", GroupKey::for_photo(None, 10), 5);
        assert_eq!(groups.peek("chat", &GroupKey::Message(10)), vec![5]);
        assert!(groups.peek("chat", &GroupKey::Message(11)).is_empty());
    }

    #[test]
    fn test_sessions_do_not_share_groups() {
        let groups = MediaGroups::new();
        groups.record("a", GroupKey::Message(1), 5);
        assert!(groups.peek("b", &GroupKey::Message(1)).is_empty());
    }
}
