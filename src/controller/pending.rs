use std::sync::Mutex;

use crate::model::task::TaskId;

use super::{CollectionState, lock_state};

/// In-flight claim on one or more task ids.
///
/// While held, any other request for the same ids is rejected as busy. The
/// claim is released on drop, including when the owning future is cancelled.
pub(super) struct PendingGuard<'a> {
    state: &'a Mutex<CollectionState>,
    ids: Vec<TaskId>,
}

impl<'a> PendingGuard<'a> {
    /// Claim every id in `ids` that is not already claimed.
    ///
    /// Returns the guard for the claimed ids and the list of ids that were busy.
    pub(super) fn claim(
        state: &'a Mutex<CollectionState>,
        ids: &[TaskId],
    ) -> (PendingGuard<'a>, Vec<TaskId>) {
        let mut claimed = Vec::with_capacity(ids.len());
        let mut busy = Vec::new();
        {
            let mut st = lock_state(state);
            for &id in ids {
                if st.pending.insert(id) {
                    claimed.push(id);
                } else {
                    busy.push(id);
                }
            }
        }
        (
            PendingGuard {
                state,
                ids: claimed,
            },
            busy,
        )
    }

    pub(super) fn ids(&self) -> &[TaskId] {
        &self.ids
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut st = lock_state(self.state);
        for id in &self.ids {
            st.pending.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let state = Mutex::new(CollectionState::default());
        let (first, busy) = PendingGuard::claim(&state, &[1, 2]);
        assert!(busy.is_empty());
        assert_eq!(first.ids(), &[1, 2]);

        let (second, busy) = PendingGuard::claim(&state, &[2, 3]);
        assert_eq!(busy, vec![2]);
        assert_eq!(second.ids(), &[3]);

        drop(first);
        let (third, busy) = PendingGuard::claim(&state, &[1, 2, 3]);
        assert_eq!(busy, vec![3]);
        assert_eq!(third.ids(), &[1, 2]);

        drop(second);
        drop(third);
        assert!(lock_state(&state).pending.is_empty());
    }
}
