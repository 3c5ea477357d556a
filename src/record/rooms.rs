//! Room count derivation
//!
//! Each field of the rooms group contributes to the count by its shape:
//!
//! | Shape | Contribution |
//! |-------|--------------|
//! | group with a presence flag (`present`, `installed`) | 1 if set, else 0 |
//! | group with a `count` | the count, 0 if absent |
//! | sequence | its length |
//! | plain flag or scalar | 1 if true or non-zero, else 0 |
//!
//! Bedrooms are a group with a `count`, so their per-bedroom surfaces never add
//! to the total, and a surface never adds a second unit on top of a presence flag.

use super::{Amenity, Bedrooms, Kitchen, OutdoorSpace, Presence, Rooms};

/// How much a rooms-group field adds to the room count
pub trait RoomContribution {
    fn room_contribution(&self) -> u32;
}

impl RoomContribution for bool {
    fn room_contribution(&self) -> u32 {
        u32::from(*self)
    }
}

impl RoomContribution for Amenity {
    fn room_contribution(&self) -> u32 {
        u32::from(self.is_truthy())
    }
}

impl RoomContribution for Presence {
    fn room_contribution(&self) -> u32 {
        u32::from(self.present)
    }
}

impl RoomContribution for OutdoorSpace {
    fn room_contribution(&self) -> u32 {
        u32::from(self.present)
    }
}

impl RoomContribution for Kitchen {
    fn room_contribution(&self) -> u32 {
        self.installed.room_contribution()
    }
}

impl RoomContribution for Bedrooms {
    fn room_contribution(&self) -> u32 {
        self.count.unwrap_or(0)
    }
}

impl<T> RoomContribution for Vec<T> {
    fn room_contribution(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }
}

impl Rooms {
    /// Per-field contributions, in declaration order
    pub fn contributions(&self) -> [(&'static str, u32); 10] {
        [
            (
                "living_room",
                self.living_room.is_some_and(|surface| surface > 0).room_contribution(),
            ),
            ("dining_room", (self.dining_room == Some(true)).room_contribution()),
            ("kitchen", self.kitchen.room_contribution()),
            ("bedrooms", self.bedrooms.room_contribution()),
            ("bathrooms", self.bathrooms_count.unwrap_or(0)),
            ("toilets", self.toilets_count.unwrap_or(0)),
            ("laundry_room", self.laundry_room.room_contribution()),
            ("office", self.office.room_contribution()),
            ("basement", self.basement.room_contribution()),
            ("attic", self.attic.room_contribution()),
        ]
    }

    /// Sum of all contributions
    pub fn room_count(&self) -> u32 {
        self.contributions()
            .iter()
            .fold(0u32, |total, (_, n)| total.saturating_add(*n))
    }
}
