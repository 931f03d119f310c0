//! Timestamp-ordered ring of pending CEA-708 units
//!
//! Units arrive in decode order but carry presentation timestamps; they are held
//! here until the decode clock has moved past them.

use tracing::warn;
use crate::constants::MAX_REFERENCE_FRAMES;
use crate::error::{CaptionError, Result};
use crate::parsers::cea708::Cea708Unit;
use crate::types::OverflowPolicy;

/// Fixed-capacity circular buffer; the `latent` slots starting at `front` are occupied
/// and sorted ascending by timestamp.
#[derive(Debug)]
pub struct ReorderBuffer {
    slots: Vec<Option<Cea708Unit>>,
    front: usize,
    latent: usize,
}

impl Default for ReorderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(MAX_REFERENCE_FRAMES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            front: 0,
            latent: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.latent
    }

    pub fn is_empty(&self) -> bool {
        self.latent == 0
    }

    #[inline]
    fn slot(&self, logical: usize) -> usize {
        (self.front + logical) % self.slots.len()
    }

    /// Inserts at the tail and restores ascending order.
    ///
    /// A full ring either evicts its head (returned) or refuses the unit, per `policy`.
    pub fn push(&mut self, unit: Cea708Unit, policy: OverflowPolicy) -> Result<Option<Cea708Unit>> {
        let mut evicted = None;
        if self.latent == self.capacity() {
            match policy {
                OverflowPolicy::Reject => {
                    warn!(capacity = self.capacity(), ts = unit.timestamp, "reorder buffer full, unit rejected");
                    return Err(CaptionError::ReorderOverflow { capacity: self.capacity() });
                }
                OverflowPolicy::DropOldest => {
                    evicted = self.pop_front();
                    if let Some(old) = &evicted {
                        warn!(capacity = self.capacity(), ts = old.timestamp, "reorder buffer full, oldest unit dropped");
                    }
                }
            }
        }

        let tail = self.slot(self.latent);
        self.slots[tail] = Some(unit);
        self.latent += 1;
        self.sort();
        Ok(evicted)
    }

    /// Bubble passes over the occupied slots; an already sorted ring costs one pass.
    fn sort(&mut self) {
        let n = self.latent;
        for pass in 0..n.saturating_sub(1) {
            let mut swapped = false;
            for j in 0..n - 1 - pass {
                let a = self.slot(j);
                let b = self.slot(j + 1);
                if ts(&self.slots[a]) > ts(&self.slots[b]) {
                    self.slots.swap(a, b);
                    swapped = true;
                }
            }
            if !swapped {
                break;
            }
        }
    }

    pub fn peek(&self) -> Option<&Cea708Unit> {
        if self.latent == 0 {
            return None;
        }
        self.slots[self.front].as_ref()
    }

    pub fn pop_front(&mut self) -> Option<Cea708Unit> {
        if self.latent == 0 {
            return None;
        }
        let unit = self.slots[self.front].take();
        self.front = (self.front + 1) % self.slots.len();
        self.latent -= 1;
        unit
    }

    /// Head unit if its timestamp is strictly before `dts`.
    pub fn pop_before(&mut self, dts: f64) -> Option<Cea708Unit> {
        match self.peek() {
            Some(head) if head.timestamp < dts => self.pop_front(),
            _ => None,
        }
    }

    /// Occupied units, head first.
    pub fn iter(&self) -> impl Iterator<Item = &Cea708Unit> + '_ {
        (0..self.latent).filter_map(move |i| self.slots[self.slot(i)].as_ref())
    }
}

fn ts(slot: &Option<Cea708Unit>) -> f64 {
    slot.as_ref().map_or(f64::INFINITY, |u| u.timestamp)
}
