// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Durable record of the machine's state and pending queue.

use std::collections::VecDeque;
use std::sync::Arc;

use super::{Event, State};
use crate::error::StorageError;
use crate::storage::{Storage, keys};

/// Saves and restores the activation state and the persistable part of the
/// pending-event queue.
///
/// Read once when the machine is built and written after every handled
/// event; never read mid-transition.
#[derive(Clone)]
pub struct ActivationStore {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for ActivationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationStore").finish_non_exhaustive()
    }
}

impl ActivationStore {
    /// Creates a store over the given key-value storage.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Persists the state name and the names of the persistable pending
    /// events, in queue order. Payload events are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be written.
    pub fn save_state(&self, state: &State, pending: &VecDeque<Event>) -> Result<(), StorageError> {
        let names: Vec<&str> = pending.iter().filter_map(Event::persisted_name).collect();
        self.storage
            .put(keys::CURRENT_STATE, &state.persisted_name())?;
        self.storage
            .put(keys::PENDING_EVENTS, &serde_json::to_string(&names)?)?;
        Ok(())
    }

    /// Loads the persisted state and pending queue.
    ///
    /// A first run yields `NotActivated` with an empty queue. An unknown
    /// state name falls back to `NotActivated`, unknown event names are
    /// dropped and a queue that is not a JSON array of strings is discarded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be read.
    pub fn load_state(&self) -> Result<(State, VecDeque<Event>), StorageError> {
        let state = match self.storage.get(keys::CURRENT_STATE)? {
            Some(name) => State::from_persisted_name(&name).unwrap_or_else(|| {
                tracing::warn!(name = %name, "Unknown persisted activation state, starting over");
                State::NotActivated
            }),
            None => State::NotActivated,
        };

        let pending = match self.storage.get(keys::PENDING_EVENTS)? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(names) => names
                    .iter()
                    .filter_map(|name| {
                        let event = Event::from_persisted_name(name);
                        if event.is_none() {
                            tracing::warn!(name = %name, "Dropping unknown persisted event");
                        }
                        event
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding malformed pending event queue");
                    VecDeque::new()
                }
            },
            None => VecDeque::new(),
        };

        Ok((state, pending))
    }

    /// Removes the persisted state and queue.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::CURRENT_STATE)?;
        self.storage.remove(keys::PENDING_EVENTS)?;
        Ok(())
    }

    /// Returns the underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}
