//! Canonical listing record
//!
//! Every listing is normalized into one [`Record`], whatever page layout it
//! was scraped from. A record starts life as a stub holding only its URL (and
//! whatever the index page revealed), is filled in place while its detail page
//! is processed, and is then handed to the record sink exactly once.
//!
//! Fields are written through [`Record::apply`] with a [`FieldPath`], so the
//! extraction code never touches the nested groups directly.

mod fields;
mod rooms;

pub use fields::{parse_flag, parse_leading_integer, FieldError, FieldPath, FieldValue};
pub use rooms::RoomContribution;

use serde::{Deserialize, Serialize};

/// One listing, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    url: String,
    pub zip_code: Option<String>,
    pub locality: Option<String>,
    pub price: Option<u64>,
    pub type_transaction: Option<String>,
    pub subtype_transaction: Option<String>,
    pub type_of_property: Option<String>,
    pub subtype_of_property: Option<String>,
    pub energy_class: Option<String>,
    pub heating_type: Option<String>,
    pub construction_year: Option<u32>,
    pub number_of_frontages: Option<u32>,
    pub surface_land: Option<u32>,
    pub surface_livable_space: Option<u32>,
    pub number_floors: Option<u32>,
    pub building_condition: Option<String>,
    pub surroundings_type: Option<String>,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub rooms: Rooms,
    #[serde(default)]
    pub extras: Extras,
    #[serde(default)]
    pub exterior: Exterior,
    #[serde(default)]
    room_count: u32,
}

/// Interior layout of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rooms {
    /// Living room surface, when the listing states one
    pub living_room: Option<u32>,
    pub dining_room: Option<bool>,
    pub kitchen: Kitchen,
    pub bedrooms: Bedrooms,
    pub bathrooms_count: Option<u32>,
    pub toilets_count: Option<u32>,
    pub laundry_room: bool,
    pub office: Presence,
    pub basement: Presence,
    pub attic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kitchen {
    /// Either a yes/no answer or the kitchen type ("Hyper equipped", ...)
    pub installed: Amenity,
    pub surface: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bedrooms {
    pub count: Option<u32>,
    /// Per-bedroom surfaces, in the order the listing numbers them
    pub surfaces: Vec<u32>,
}

/// A room that is either there or not, with an optional surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presence {
    pub present: bool,
    pub surface: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extras {
    pub open_fire: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exterior {
    pub terrace: OutdoorSpace,
    pub garden: OutdoorSpace,
    pub swimming_pool: Amenity,
}

/// Terrace or garden
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutdoorSpace {
    pub present: bool,
    pub surface: Option<u32>,
    pub orientation: Option<String>,
}

/// A feature reported either as yes/no or as a free-text description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amenity {
    Flag(bool),
    Described(String),
}

impl Default for Amenity {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl Amenity {
    /// A description counts as present unless it is empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Described(text) => !text.trim().is_empty(),
        }
    }
}

impl Record {
    /// Creates a stub: every optional field unset, only `url` populated
    pub fn stub(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            zip_code: None,
            locality: None,
            price: None,
            type_transaction: None,
            subtype_transaction: None,
            type_of_property: None,
            subtype_of_property: None,
            energy_class: None,
            heating_type: None,
            construction_year: None,
            number_of_frontages: None,
            surface_land: None,
            surface_livable_space: None,
            number_floors: None,
            building_condition: None,
            surroundings_type: None,
            furnished: false,
            rooms: Rooms::default(),
            extras: Extras::default(),
            exterior: Exterior::default(),
            room_count: 0,
        }
    }

    /// The listing URL; never changes after creation and identifies the record
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Room count as of the last [`Record::refresh_room_count`]
    pub fn room_count(&self) -> u32 {
        self.room_count
    }

    /// Recomputes `room_count` from the current rooms group
    ///
    /// The count is derived from scratch every time, so calling this twice in
    /// a row yields the same value.
    pub fn refresh_room_count(&mut self) -> u32 {
        self.room_count = self.rooms.room_count();
        self.room_count
    }
}
