//! In-flight child loads.
//!
//! Every expansion that needs a fetch takes a ticket. A fetch result is only
//! spliced while its ticket is still the current one for the node: collapsing
//! the node, removing it with an ancestor, or replacing the roots all
//! invalidate the ticket.

use super::flat::NodeKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which collapse events are ignored while loads are outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseGuard {
    /// Ignore every collapse while any load is in flight.
    #[default]
    Global,
    /// Ignore only collapses of nodes whose own load is in flight.
    PerNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoadTicket {
    pub(crate) key: NodeKey,
    serial: u64,
}

#[derive(Debug, Default)]
pub(crate) struct LoadTracker {
    in_flight: HashMap<NodeKey, u64>,
    next_serial: u64,
}

impl LoadTracker {
    /// Start a load for `key`; `None` if one is already outstanding.
    pub(crate) fn begin(&mut self, key: NodeKey) -> Option<LoadTicket> {
        if self.in_flight.contains_key(&key) {
            return None;
        }
        self.next_serial += 1;
        let serial = self.next_serial;
        self.in_flight.insert(key, serial);
        Some(LoadTicket { key, serial })
    }

    /// Retire a ticket. Returns true if it was still current.
    pub(crate) fn finish(&mut self, ticket: LoadTicket) -> bool {
        match self.in_flight.get(&ticket.key) {
            Some(&serial) if serial == ticket.serial => {
                self.in_flight.remove(&ticket.key);
                true
            }
            _ => false,
        }
    }

    /// Drop any outstanding load for `key`.
    pub(crate) fn cancel(&mut self, key: NodeKey) -> bool {
        self.in_flight.remove(&key).is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.in_flight.clear();
    }

    pub(crate) fn is_loading(&self, key: NodeKey) -> bool {
        self.in_flight.contains_key(&key)
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn suppresses_collapse(&self, guard: CollapseGuard, key: NodeKey) -> bool {
        match guard {
            CollapseGuard::Global => !self.is_idle(),
            CollapseGuard::PerNode => self.is_loading(key),
        }
    }
}
