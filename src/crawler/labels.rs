//! Header labels of the detail page attribute tables
//!
//! Each rule maps a header-cell predicate to the record field its value is
//! written to. Rules are mutually exclusive (the "surface" and "orientation"
//! guards keep `Garden` from also matching `Garden surface`), so the order of
//! the table carries no meaning.

use crate::record::FieldPath;

/// How a rule recognizes a header cell (case-sensitive)
#[derive(Debug, Clone, Copy)]
pub enum LabelMatch {
    /// Header contains the text
    Contains(&'static str),

    /// Header contains the text and none of the excluded words
    ContainsExcept(&'static str, &'static [&'static str]),

    /// "Bedroom 1 surface", "Bedroom 2 surface", ...
    NumberedBedroomSurface,
}

impl LabelMatch {
    pub fn matches(&self, header: &str) -> bool {
        match self {
            Self::Contains(label) => header.contains(label),
            Self::ContainsExcept(label, excluded) => {
                header.contains(label) && !excluded.iter().any(|word| header.contains(word))
            }
            Self::NumberedBedroomSurface => is_numbered_bedroom_surface(header),
        }
    }
}

/// A header predicate and the field it feeds
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub label: LabelMatch,
    pub target: FieldPath,
}

const fn rule(label: LabelMatch, target: FieldPath) -> LabelRule {
    LabelRule { label, target }
}

const SURFACE: &[&str] = &["surface"];
const SURFACE_OR_ORIENTATION: &[&str] = &["surface", "orientation"];

/// Every header label understood by the table pass
pub static LABEL_RULES: &[LabelRule] = &[
    rule(LabelMatch::Contains("Energy class"), FieldPath::EnergyClass),
    rule(LabelMatch::Contains("Heating type"), FieldPath::HeatingType),
    rule(LabelMatch::Contains("Construction year"), FieldPath::ConstructionYear),
    rule(LabelMatch::Contains("Number of frontages"), FieldPath::NumberOfFrontages),
    rule(LabelMatch::Contains("Living area"), FieldPath::SurfaceLivableSpace),
    rule(LabelMatch::Contains("Number of floors"), FieldPath::NumberFloors),
    rule(LabelMatch::Contains("Building condition"), FieldPath::BuildingCondition),
    rule(LabelMatch::Contains("Surroundings type"), FieldPath::SurroundingsType),
    rule(LabelMatch::Contains("Furnished"), FieldPath::Furnished),
    rule(LabelMatch::Contains("Living room surface"), FieldPath::LivingRoomSurface),
    rule(LabelMatch::Contains("Dining room"), FieldPath::DiningRoom),
    rule(LabelMatch::Contains("Kitchen type"), FieldPath::KitchenInstalled),
    rule(LabelMatch::Contains("Kitchen surface"), FieldPath::KitchenSurface),
    rule(LabelMatch::Contains("Bedrooms"), FieldPath::BedroomsCount),
    rule(LabelMatch::NumberedBedroomSurface, FieldPath::BedroomSurface),
    rule(LabelMatch::Contains("Bathrooms"), FieldPath::BathroomsCount),
    rule(LabelMatch::Contains("Toilets"), FieldPath::ToiletsCount),
    rule(LabelMatch::Contains("Laundry room"), FieldPath::LaundryRoom),
    rule(LabelMatch::ContainsExcept("Office", SURFACE), FieldPath::Office),
    rule(LabelMatch::Contains("Office surface"), FieldPath::OfficeSurface),
    rule(LabelMatch::ContainsExcept("Basement", SURFACE), FieldPath::Basement),
    rule(LabelMatch::Contains("Basement surface"), FieldPath::BasementSurface),
    rule(LabelMatch::Contains("Attic"), FieldPath::Attic),
    rule(LabelMatch::Contains("Surface of the plot"), FieldPath::SurfaceLand),
    rule(LabelMatch::ContainsExcept("Garden", SURFACE_OR_ORIENTATION), FieldPath::Garden),
    rule(LabelMatch::Contains("Garden surface"), FieldPath::GardenSurface),
    rule(LabelMatch::Contains("Garden orientation"), FieldPath::GardenOrientation),
    rule(LabelMatch::ContainsExcept("Terrace", SURFACE_OR_ORIENTATION), FieldPath::Terrace),
    rule(LabelMatch::Contains("Terrace surface"), FieldPath::TerraceSurface),
    rule(LabelMatch::Contains("Terrace orientation"), FieldPath::TerraceOrientation),
    rule(LabelMatch::Contains("Swimming pool"), FieldPath::SwimmingPool),
];

/// Looks up the field a table header feeds, if any
pub fn match_label(header: &str) -> Option<FieldPath> {
    LABEL_RULES
        .iter()
        .find(|rule| rule.label.matches(header))
        .map(|rule| rule.target)
}

fn is_numbered_bedroom_surface(header: &str) -> bool {
    header
        .strip_prefix("Bedroom ")
        .and_then(|rest| rest.strip_suffix(" surface"))
        .map(|number| !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Headers as they appear on detail pages
    const KNOWN_HEADERS: &[(&str, FieldPath)] = &[
        ("Energy class", FieldPath::EnergyClass),
        ("Heating type", FieldPath::HeatingType),
        ("Construction year", FieldPath::ConstructionYear),
        ("Number of frontages", FieldPath::NumberOfFrontages),
        ("Living area", FieldPath::SurfaceLivableSpace),
        ("Number of floors", FieldPath::NumberFloors),
        ("Building condition", FieldPath::BuildingCondition),
        ("Surroundings type", FieldPath::SurroundingsType),
        ("Furnished", FieldPath::Furnished),
        ("Living room surface", FieldPath::LivingRoomSurface),
        ("Dining room", FieldPath::DiningRoom),
        ("Kitchen type", FieldPath::KitchenInstalled),
        ("Kitchen surface", FieldPath::KitchenSurface),
        ("Bedrooms", FieldPath::BedroomsCount),
        ("Bedroom 1 surface", FieldPath::BedroomSurface),
        ("Bedroom 12 surface", FieldPath::BedroomSurface),
        ("Bathrooms", FieldPath::BathroomsCount),
        ("Toilets", FieldPath::ToiletsCount),
        ("Laundry room", FieldPath::LaundryRoom),
        ("Office", FieldPath::Office),
        ("Office surface", FieldPath::OfficeSurface),
        ("Basement", FieldPath::Basement),
        ("Basement surface", FieldPath::BasementSurface),
        ("Attic", FieldPath::Attic),
        ("Surface of the plot", FieldPath::SurfaceLand),
        ("Garden", FieldPath::Garden),
        ("Garden surface", FieldPath::GardenSurface),
        ("Garden orientation", FieldPath::GardenOrientation),
        ("Terrace", FieldPath::Terrace),
        ("Terrace surface", FieldPath::TerraceSurface),
        ("Terrace orientation", FieldPath::TerraceOrientation),
        ("Swimming pool", FieldPath::SwimmingPool),
    ];

    #[test]
    fn test_known_headers_map_to_their_field() {
        for (header, expected) in KNOWN_HEADERS {
            assert_eq!(match_label(header), Some(*expected), "header {:?}", header);
        }
    }

    #[test]
    fn test_rules_are_mutually_exclusive() {
        for (header, _) in KNOWN_HEADERS {
            let hits = LABEL_RULES
                .iter()
                .filter(|rule| rule.label.matches(header))
                .count();
            assert_eq!(hits, 1, "header {:?} matched {} rules", header, hits);
        }
    }

    #[test]
    fn test_every_rule_is_reachable() {
        for rule in LABEL_RULES {
            assert!(
                KNOWN_HEADERS.iter().any(|(_, target)| *target == rule.target),
                "no known header for {}",
                rule.target
            );
        }
    }

    #[test]
    fn test_unknown_headers() {
        assert_eq!(match_label("Flood zone type"), None);
        assert_eq!(match_label("CO₂ emission"), None);
        assert_eq!(match_label(""), None);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(match_label("swimming pool"), None);
        assert_eq!(match_label("ATTIC"), None);
    }

    #[test]
    fn test_numbered_bedroom_surface() {
        assert!(is_numbered_bedroom_surface("Bedroom 3 surface"));
        assert!(!is_numbered_bedroom_surface("Bedroom surface"));
        assert!(!is_numbered_bedroom_surface("Bedroom x surface"));
        assert!(!is_numbered_bedroom_surface("Bedrooms"));
    }
}
