//! Field-path based updates of a [`Record`]
//!
//! Extraction code describes what it found as `(FieldPath, FieldValue)` pairs.
//! Each path knows how to coerce a value into its target type, and which
//! related fields it implies (a garden surface implies a garden).

use super::{Amenity, Record};
use std::fmt;
use thiserror::Error;

/// A value that could not be stored in its target field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot store {value:?} in {path}: {reason}")]
pub struct FieldError {
    pub path: FieldPath,
    pub value: String,
    pub reason: &'static str,
}

/// A raw value found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Flag(true) => write!(f, "Yes"),
            Self::Flag(false) => write!(f, "No"),
        }
    }
}

/// Every settable leaf of a [`Record`], except the immutable `url`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    ZipCode,
    Locality,
    Price,
    TypeTransaction,
    SubtypeTransaction,
    TypeOfProperty,
    SubtypeOfProperty,
    EnergyClass,
    HeatingType,
    ConstructionYear,
    NumberOfFrontages,
    SurfaceLand,
    SurfaceLivableSpace,
    NumberFloors,
    BuildingCondition,
    SurroundingsType,
    Furnished,
    LivingRoomSurface,
    DiningRoom,
    KitchenInstalled,
    KitchenSurface,
    BedroomsCount,
    /// Appends to the ordered bedroom surfaces instead of overwriting
    BedroomSurface,
    BathroomsCount,
    ToiletsCount,
    LaundryRoom,
    Office,
    OfficeSurface,
    Basement,
    BasementSurface,
    Attic,
    OpenFire,
    Terrace,
    TerraceSurface,
    TerraceOrientation,
    Garden,
    GardenSurface,
    GardenOrientation,
    SwimmingPool,
}

impl FieldPath {
    /// Dotted path of the field in the serialized record
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZipCode => "zip_code",
            Self::Locality => "locality",
            Self::Price => "price",
            Self::TypeTransaction => "type_transaction",
            Self::SubtypeTransaction => "subtype_transaction",
            Self::TypeOfProperty => "type_of_property",
            Self::SubtypeOfProperty => "subtype_of_property",
            Self::EnergyClass => "energy_class",
            Self::HeatingType => "heating_type",
            Self::ConstructionYear => "construction_year",
            Self::NumberOfFrontages => "number_of_frontages",
            Self::SurfaceLand => "surface_land",
            Self::SurfaceLivableSpace => "surface_livable_space",
            Self::NumberFloors => "number_floors",
            Self::BuildingCondition => "building_condition",
            Self::SurroundingsType => "surroundings_type",
            Self::Furnished => "furnished",
            Self::LivingRoomSurface => "rooms.living_room",
            Self::DiningRoom => "rooms.dining_room",
            Self::KitchenInstalled => "rooms.kitchen.installed",
            Self::KitchenSurface => "rooms.kitchen.surface",
            Self::BedroomsCount => "rooms.bedrooms.count",
            Self::BedroomSurface => "rooms.bedrooms.surfaces",
            Self::BathroomsCount => "rooms.bathrooms_count",
            Self::ToiletsCount => "rooms.toilets_count",
            Self::LaundryRoom => "rooms.laundry_room",
            Self::Office => "rooms.office.present",
            Self::OfficeSurface => "rooms.office.surface",
            Self::Basement => "rooms.basement.present",
            Self::BasementSurface => "rooms.basement.surface",
            Self::Attic => "rooms.attic",
            Self::OpenFire => "extras.open_fire",
            Self::Terrace => "exterior.terrace.present",
            Self::TerraceSurface => "exterior.terrace.surface",
            Self::TerraceOrientation => "exterior.terrace.orientation",
            Self::Garden => "exterior.garden.present",
            Self::GardenSurface => "exterior.garden.surface",
            Self::GardenOrientation => "exterior.garden.orientation",
            Self::SwimmingPool => "exterior.swimming_pool",
        }
    }

    fn error(self, value: &FieldValue, reason: &'static str) -> FieldError {
        FieldError {
            path: self,
            value: value.to_string(),
            reason,
        }
    }

    fn text(self, value: &FieldValue) -> Result<String, FieldError> {
        let text = value.to_string().trim().to_string();
        if text.is_empty() {
            return Err(self.error(value, "empty value"));
        }
        Ok(text)
    }

    fn integer(self, value: &FieldValue) -> Result<u32, FieldError> {
        match value {
            FieldValue::Integer(n) => {
                u32::try_from(*n).map_err(|_| self.error(value, "out of range"))
            }
            FieldValue::Text(text) => {
                parse_leading_integer(text).ok_or_else(|| self.error(value, "not a number"))
            }
            FieldValue::Flag(_) => Err(self.error(value, "expected a number")),
        }
    }

    fn amount(self, value: &FieldValue) -> Result<u64, FieldError> {
        match value {
            FieldValue::Integer(n) => {
                u64::try_from(*n).map_err(|_| self.error(value, "negative amount"))
            }
            FieldValue::Text(text) => {
                let digits: String = text
                    .trim()
                    .trim_start_matches(|c: char| !c.is_ascii_digit())
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || matches!(c, ',' | ' ' | '\u{a0}'))
                    .filter(char::is_ascii_digit)
                    .collect();
                digits
                    .parse()
                    .map_err(|_| self.error(value, "not an amount"))
            }
            FieldValue::Flag(_) => Err(self.error(value, "expected an amount")),
        }
    }

    fn flag(self, value: &FieldValue) -> Result<bool, FieldError> {
        match value {
            FieldValue::Flag(flag) => Ok(*flag),
            FieldValue::Integer(n) => Ok(*n != 0),
            FieldValue::Text(text) => parse_flag(text)
                .or_else(|| parse_leading_integer(text).map(|n| n != 0))
                .ok_or_else(|| self.error(value, "expected Yes or No")),
        }
    }

    fn amenity(self, value: &FieldValue) -> Result<Amenity, FieldError> {
        match value {
            FieldValue::Text(text) => match parse_flag(text) {
                Some(flag) => Ok(Amenity::Flag(flag)),
                None => Ok(Amenity::Described(self.text(value)?)),
            },
            other => self.flag(other).map(Amenity::Flag),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Record {
    /// Stores one value at `path`
    ///
    /// On error the record is left untouched.
    pub fn apply(&mut self, path: FieldPath, value: FieldValue) -> Result<(), FieldError> {
        use FieldPath::*;

        let value = &value;
        match path {
            ZipCode => self.zip_code = Some(path.text(value)?),
            Locality => self.locality = Some(path.text(value)?),
            Price => self.price = Some(path.amount(value)?),
            TypeTransaction => self.type_transaction = Some(path.text(value)?),
            SubtypeTransaction => self.subtype_transaction = Some(path.text(value)?),
            TypeOfProperty => self.type_of_property = Some(path.text(value)?),
            SubtypeOfProperty => self.subtype_of_property = Some(path.text(value)?),
            EnergyClass => self.energy_class = Some(path.text(value)?),
            HeatingType => self.heating_type = Some(path.text(value)?),
            ConstructionYear => self.construction_year = Some(path.integer(value)?),
            NumberOfFrontages => self.number_of_frontages = Some(path.integer(value)?),
            SurfaceLand => self.surface_land = Some(path.integer(value)?),
            SurfaceLivableSpace => self.surface_livable_space = Some(path.integer(value)?),
            NumberFloors => self.number_floors = Some(path.integer(value)?),
            BuildingCondition => self.building_condition = Some(path.text(value)?),
            SurroundingsType => self.surroundings_type = Some(path.text(value)?),
            Furnished => self.furnished = path.flag(value)?,
            LivingRoomSurface => self.rooms.living_room = Some(path.integer(value)?),
            DiningRoom => self.rooms.dining_room = Some(path.flag(value)?),
            KitchenInstalled => {
                self.rooms.kitchen.installed = match path.text(value)?.as_str() {
                    "Not installed" => Amenity::Flag(false),
                    _ => path.amenity(value)?,
                }
            }
            KitchenSurface => {
                self.rooms.kitchen.surface = Some(path.integer(value)?);
                if self.rooms.kitchen.installed == Amenity::Flag(false) {
                    self.rooms.kitchen.installed = Amenity::Flag(true);
                }
            }
            BedroomsCount => self.rooms.bedrooms.count = Some(path.integer(value)?),
            BedroomSurface => {
                let surface = path.integer(value)?;
                self.rooms.bedrooms.surfaces.push(surface);
            }
            BathroomsCount => self.rooms.bathrooms_count = Some(path.integer(value)?),
            ToiletsCount => self.rooms.toilets_count = Some(path.integer(value)?),
            LaundryRoom => self.rooms.laundry_room = path.flag(value)?,
            Office => self.rooms.office.present = path.flag(value)?,
            OfficeSurface => {
                self.rooms.office.surface = Some(path.integer(value)?);
                self.rooms.office.present = true;
            }
            Basement => self.rooms.basement.present = path.flag(value)?,
            BasementSurface => {
                self.rooms.basement.surface = Some(path.integer(value)?);
                self.rooms.basement.present = true;
            }
            Attic => self.rooms.attic = path.flag(value)?,
            OpenFire => self.extras.open_fire = path.flag(value)?,
            Terrace => self.exterior.terrace.present = path.flag(value)?,
            TerraceSurface => {
                self.exterior.terrace.surface = Some(path.integer(value)?);
                self.exterior.terrace.present = true;
            }
            TerraceOrientation => self.exterior.terrace.orientation = Some(path.text(value)?),
            Garden => self.exterior.garden.present = path.flag(value)?,
            GardenSurface => {
                self.exterior.garden.surface = Some(path.integer(value)?);
                self.exterior.garden.present = true;
            }
            GardenOrientation => self.exterior.garden.orientation = Some(path.text(value)?),
            SwimmingPool => self.exterior.swimming_pool = path.amenity(value)?,
        }

        Ok(())
    }

    /// Applies every update in order and returns the ones that were rejected
    pub fn apply_fields<I>(&mut self, updates: I) -> Vec<FieldError>
    where
        I: IntoIterator<Item = (FieldPath, FieldValue)>,
    {
        updates
            .into_iter()
            .filter_map(|(path, value)| self.apply(path, value).err())
            .collect()
    }
}

/// Normalizes a textual yes/no answer
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

/// Parses the integer a value starts with ("120 m² square meters" → 120)
///
/// Thousands separators (`,`, space or no-break space followed by three
/// digits) are skipped, so "1,250 m²" is 1250. Any fractional part is dropped.
pub fn parse_leading_integer(text: &str) -> Option<u32> {
    let text = text.trim();
    let lead = digit_run(text);
    if lead == 0 {
        return None;
    }

    let mut digits = text[..lead].to_string();
    let mut rest = &text[lead..];
    if lead <= 3 {
        while let Some(group) = rest
            .strip_prefix(|c: char| matches!(c, ',' | ' ' | '\u{a0}' | '\u{202f}'))
            .filter(|after| digit_run(after) == 3)
        {
            digits.push_str(&group[..3]);
            rest = &group[3..];
        }
    }

    digits.parse().ok()
}

fn digit_run(text: &str) -> usize {
    text.find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len())
}
