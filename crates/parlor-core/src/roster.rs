//! Roster of online peers.
//!
//! Pure data, no UI handles: the presentation layer renders it, the session
//! state machine is the only mutator, and mutations are never concurrent
//! (single-reactor ownership). Insertion order is preserved because it is the
//! display order.

use crate::types::{Identity, UserId};

/// Ordered collection of currently-known online peers, keyed by user id.
///
/// Invariants: ids are unique, and the session's own id never appears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<Identity>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer unless its id is already present or equals `self_id`.
    ///
    /// A re-add of a present id is an idempotent refresh of the display
    /// fields, not an error: the server may announce a peer the snapshot
    /// already contained.
    pub fn add(&mut self, entry: Identity, self_id: UserId) {
        if entry.user_id == self_id {
            return;
        }
        if let Some(existing) = self.entries.iter_mut().find(|e| e.user_id == entry.user_id) {
            *existing = entry;
            return;
        }
        self.entries.push(entry);
    }

    /// Remove the peer with `user_id`. No-op when absent.
    pub fn remove(&mut self, user_id: UserId) {
        self.entries.retain(|e| e.user_id != user_id);
    }

    /// Seed from the server's authorization snapshot, dropping any entry
    /// whose id equals `self_id`.
    pub fn bulk_load<I>(&mut self, entries: I, self_id: UserId)
    where
        I: IntoIterator<Item = Identity>,
    {
        self.entries.clear();
        for entry in entries {
            self.add(entry, self_id);
        }
    }

    pub fn find(&self, user_id: UserId) -> Option<&Identity> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Peers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.entries.iter()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;

    fn peer(id: u32, name: &str) -> Identity {
        Identity {
            user_id: UserId(id),
            user_name: name.to_string(),
            gender: Gender::Unknown,
            user_color: "#2980b9".to_string(),
        }
    }

    const SELF_ID: UserId = UserId(7);

    #[test]
    fn add_preserves_arrival_order() {
        let mut roster = Roster::new();
        roster.add(peer(3, "Bob"), SELF_ID);
        roster.add(peer(1, "Ann"), SELF_ID);
        roster.add(peer(9, "Kim"), SELF_ID);

        let names: Vec<_> = roster.iter().map(|e| e.user_name.as_str()).collect();
        assert_eq!(names, ["Bob", "Ann", "Kim"]);
    }

    #[test]
    fn add_never_admits_self() {
        let mut roster = Roster::new();
        roster.add(peer(7, "Me"), SELF_ID);
        assert!(roster.is_empty());
    }

    #[test]
    fn re_add_refreshes_display_fields_without_duplicating() {
        let mut roster = Roster::new();
        roster.add(peer(3, "Bob"), SELF_ID);
        roster.add(peer(5, "Eve"), SELF_ID);

        let mut refreshed = peer(3, "Bobby");
        refreshed.user_color = "#c0392b".to_string();
        roster.add(refreshed, SELF_ID);

        assert_eq!(roster.len(), 2);
        let entry = roster.find(UserId(3)).expect("still present");
        assert_eq!(entry.user_name, "Bobby");
        assert_eq!(entry.user_color, "#c0392b");
        // Position is unchanged by a refresh.
        assert_eq!(roster.iter().next().map(|e| e.user_id), Some(UserId(3)));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut roster = Roster::new();
        roster.add(peer(3, "Bob"), SELF_ID);

        roster.remove(UserId(3));
        let after_first = roster.clone();
        roster.remove(UserId(3));

        assert_eq!(roster, after_first);
        assert!(roster.find(UserId(3)).is_none());
    }

    #[test]
    fn bulk_load_skips_self_and_replaces_contents() {
        let mut roster = Roster::new();
        roster.add(peer(42, "Stale"), SELF_ID);

        roster.bulk_load([peer(7, "Me"), peer(3, "Bob"), peer(5, "Eve")], SELF_ID);

        assert_eq!(roster.len(), 2);
        assert!(roster.find(UserId(7)).is_none());
        assert!(roster.find(UserId(42)).is_none());
        assert!(roster.find(UserId(3)).is_some());
    }

    #[test]
    fn clear_empties_roster() {
        let mut roster = Roster::new();
        roster.add(peer(3, "Bob"), SELF_ID);
        roster.clear();
        assert!(roster.is_empty());
    }
}
