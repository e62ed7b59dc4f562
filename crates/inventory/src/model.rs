//! Inventory documents and the deltas applied to them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::{EventId, Owner, SectionId};
use serde::{Deserialize, Serialize};

/// Seat counters for one section of one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionInventory {
    /// Active tickets held by real users.
    pub taken: u32,
    /// Active tickets held by an admin sentinel owner.
    pub unavailable: u32,
    /// Fixed seat count of the section.
    pub total: u32,
}

impl SectionInventory {
    /// Creates an empty entry for a section of the given size.
    pub fn with_total(total: u32) -> Self {
        Self {
            taken: 0,
            unavailable: 0,
            total,
        }
    }

    /// Seats still open for sale.
    pub fn remaining(&self) -> u32 {
        self.total
            .saturating_sub(self.taken)
            .saturating_sub(self.unavailable)
    }

    /// Returns true when no seat is left.
    pub fn is_sold_out(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns true when some, but at most `threshold`, seats are left.
    pub fn is_low(&self, threshold: u32) -> bool {
        let remaining = self.remaining();
        remaining > 0 && remaining <= threshold
    }

    fn apply(&mut self, change: &SectionChange) {
        self.taken = apply_signed(self.taken, change.taken);
        self.unavailable = apply_signed(self.unavailable, change.unavailable);
        self.total = change.total;
    }
}

/// The aggregated inventory document of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    pub event_id: EventId,
    pub sections: BTreeMap<SectionId, SectionInventory>,
    pub total_seats_sold: u64,
    pub updated_at: DateTime<Utc>,
}

impl EventInventory {
    /// Creates an empty document.
    pub fn new(event_id: EventId, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            sections: BTreeMap::new(),
            total_seats_sold: 0,
            updated_at: now,
        }
    }

    /// Gets the counters of a section.
    pub fn section(&self, section: &SectionId) -> Option<&SectionInventory> {
        self.sections.get(section)
    }

    /// Seats still open for sale across every known section.
    pub fn remaining(&self) -> u64 {
        self.sections.values().map(|s| s.remaining() as u64).sum()
    }

    /// Applies a delta in place. Counters saturate at zero.
    pub fn apply(&mut self, delta: &InventoryDelta, now: DateTime<Utc>) {
        for (section, change) in &delta.sections {
            self.sections
                .entry(section.clone())
                .or_insert_with(|| SectionInventory::with_total(change.total))
                .apply(change);
        }
        self.total_seats_sold = if delta.seats_sold < 0 {
            self.total_seats_sold
                .saturating_sub(delta.seats_sold.unsigned_abs())
        } else {
            self.total_seats_sold.saturating_add(delta.seats_sold as u64)
        };
        self.updated_at = now;
    }
}

/// Signed change to the counters of one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionChange {
    pub taken: i64,
    pub unavailable: i64,
    /// Section size, written over the stored value.
    pub total: u32,
}

/// Signed change to an event's inventory, grouped per section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryDelta {
    pub sections: BTreeMap<SectionId, SectionChange>,
    pub seats_sold: i64,
}

impl InventoryDelta {
    /// Creates an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one seat gained by `owner`.
    pub fn add_seat(&mut self, section: SectionId, owner: &Owner, total: u32) {
        self.record(section, owner, 1, total);
    }

    /// Counts one seat given up by `owner`.
    pub fn remove_seat(&mut self, section: SectionId, owner: &Owner, total: u32) {
        self.record(section, owner, -1, total);
    }

    /// Returns true if the delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.seats_sold == 0
    }

    fn record(&mut self, section: SectionId, owner: &Owner, step: i64, total: u32) {
        let change = self.sections.entry(section).or_default();
        change.total = total;
        if owner.is_sentinel() {
            change.unavailable += step;
        } else {
            change.taken += step;
            self.seats_sold += step;
        }
    }
}

fn apply_signed(current: u32, delta: i64) -> u32 {
    (current as i64 + delta).clamp(0, u32::MAX as i64) as u32
}
