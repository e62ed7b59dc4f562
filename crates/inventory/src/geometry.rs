//! Venue section geometry.

use std::collections::HashMap;

use common::SectionId;

/// Source of the fixed seat count of each section.
pub trait SectionGeometry: Send + Sync {
    /// Returns the number of seats in a section. Unknown sections have none.
    fn total_seats_for_section(&self, section: &SectionId) -> u32;
}

/// Rows and seats per row of a rectangular section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionShape {
    pub rows: u32,
    pub seats_per_row: u32,
}

impl SectionShape {
    pub fn new(rows: u32, seats_per_row: u32) -> Self {
        Self {
            rows,
            seats_per_row,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.rows * self.seats_per_row
    }
}

/// Section layout of an arena.
#[derive(Debug, Clone, Default)]
pub struct ArenaLayout {
    sections: HashMap<SectionId, SectionShape>,
}

impl ArenaLayout {
    /// Lower bowl rows A-L with 20 seats each.
    pub const LOWER_BOWL: SectionShape = SectionShape {
        rows: 12,
        seats_per_row: 20,
    };

    /// Upper level rows A-O with 24 seats each.
    pub const UPPER_LEVEL: SectionShape = SectionShape {
        rows: 15,
        seats_per_row: 24,
    };

    /// Suite boxes.
    pub const SUITE: SectionShape = SectionShape {
        rows: 2,
        seats_per_row: 12,
    };

    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// The arena's standard layout: sections 101-116, 201-216 and `SUITE`.
    pub fn standard() -> Self {
        let mut layout = Self::new();
        for n in 101..=116 {
            layout = layout.with_section(n.to_string(), Self::LOWER_BOWL);
        }
        for n in 201..=216 {
            layout = layout.with_section(n.to_string(), Self::UPPER_LEVEL);
        }
        layout.with_section("SUITE", Self::SUITE)
    }

    /// Adds or replaces a section.
    pub fn with_section(mut self, section: impl Into<String>, shape: SectionShape) -> Self {
        self.sections.insert(SectionId::new(section), shape);
        self
    }

    /// Gets the shape of a section.
    pub fn shape(&self, section: &SectionId) -> Option<SectionShape> {
        self.sections.get(section).copied()
    }

    /// Returns the number of sections in the layout.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns the capacity of the whole venue.
    pub fn capacity(&self) -> u64 {
        self.sections.values().map(|s| s.capacity() as u64).sum()
    }
}

impl SectionGeometry for ArenaLayout {
    fn total_seats_for_section(&self, section: &SectionId) -> u32 {
        self.shape(section).map(|s| s.capacity()).unwrap_or(0)
    }
}
