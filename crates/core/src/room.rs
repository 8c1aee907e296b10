//! Room assistant: upload checks and the canned furniture suggestion
//! generator.
//!
//! There is no image model. A room type and a style pick four furniture
//! templates and a palette; the uploaded photo is only checked for type and
//! size. Output for a given room and style is always the same.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Why an uploaded room photo was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("Image file required")]
    Missing,
    #[error("Invalid file type. Only JPEG, PNG, and WebP are allowed")]
    UnsupportedType,
    #[error("File size too large. Maximum size is {max_mb}MB")]
    TooLarge { max_mb: usize },
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// Match a `Content-Type` value, ignoring parameters and case.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Check an upload's declared type and byte length against `max_bytes`.
///
/// # Errors
///
/// - [`UploadError::Missing`] for an empty body
/// - [`UploadError::UnsupportedType`] for anything but JPEG, PNG or WebP
/// - [`UploadError::TooLarge`] above `max_bytes`
pub fn check_upload(
    content_type: Option<&str>,
    len: usize,
    max_bytes: usize,
) -> Result<ImageKind, UploadError> {
    if len == 0 {
        return Err(UploadError::Missing);
    }
    let kind = content_type
        .and_then(ImageKind::from_content_type)
        .ok_or(UploadError::UnsupportedType)?;
    if len > max_bytes {
        return Err(UploadError::TooLarge {
            max_mb: max_bytes / (1024 * 1024),
        });
    }
    Ok(kind)
}

/// Rooms the assistant knows how to furnish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    #[default]
    LivingRoom,
    Bedroom,
    DiningRoom,
    Office,
    Kitchen,
}

/// One piece of furniture suggested for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FurnitureTemplate {
    pub name: &'static str,
    pub category: &'static str,
    /// Price in whole dollars before the style multiplier.
    pub base_price: u32,
}

const fn item(name: &'static str, category: &'static str, base_price: u32) -> FurnitureTemplate {
    FurnitureTemplate {
        name,
        category,
        base_price,
    }
}

const LIVING_ROOM: [FurnitureTemplate; 4] = [
    item("Sofa", "Seating", 599),
    item("Coffee Table", "Tables", 299),
    item("Floor Lamp", "Lighting", 149),
    item("Bookshelf", "Storage", 199),
];

const BEDROOM: [FurnitureTemplate; 4] = [
    item("Bed Frame", "Bedroom", 499),
    item("Nightstand", "Bedroom", 129),
    item("Dresser", "Storage", 349),
    item("Table Lamp", "Lighting", 79),
];

const DINING_ROOM: [FurnitureTemplate; 4] = [
    item("Dining Table", "Tables", 799),
    item("Dining Chairs", "Seating", 149),
    item("Sideboard", "Storage", 599),
    item("Pendant Light", "Lighting", 199),
];

const OFFICE: [FurnitureTemplate; 4] = [
    item("Desk", "Office", 399),
    item("Office Chair", "Seating", 249),
    item("Filing Cabinet", "Storage", 179),
    item("Desk Lamp", "Lighting", 89),
];

const KITCHEN: [FurnitureTemplate; 4] = [
    item("Kitchen Island", "Kitchen", 899),
    item("Bar Stools", "Seating", 99),
    item("Storage Cabinet", "Storage", 299),
    item("Pendant Lights", "Lighting", 129),
];

impl RoomType {
    pub const ALL: [Self; 5] = [
        Self::LivingRoom,
        Self::Bedroom,
        Self::DiningRoom,
        Self::Office,
        Self::Kitchen,
    ];

    /// Parse a form value; anything unrecognised is a living room.
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "bedroom" => Self::Bedroom,
            "dining_room" => Self::DiningRoom,
            "office" => Self::Office,
            "kitchen" => Self::Kitchen,
            _ => Self::LivingRoom,
        }
    }

    /// Form value.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LivingRoom => "living_room",
            Self::Bedroom => "bedroom",
            Self::DiningRoom => "dining_room",
            Self::Office => "office",
            Self::Kitchen => "kitchen",
        }
    }

    /// Lowercase words for sentences ("dining room").
    #[must_use]
    pub const fn words(self) -> &'static str {
        match self {
            Self::LivingRoom => "living room",
            Self::Bedroom => "bedroom",
            Self::DiningRoom => "dining room",
            Self::Office => "office",
            Self::Kitchen => "kitchen",
        }
    }

    /// Title-case label for select boxes.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LivingRoom => "Living Room",
            Self::Bedroom => "Bedroom",
            Self::DiningRoom => "Dining Room",
            Self::Office => "Office",
            Self::Kitchen => "Kitchen",
        }
    }

    #[must_use]
    pub const fn furniture(self) -> &'static [FurnitureTemplate; 4] {
        match self {
            Self::LivingRoom => &LIVING_ROOM,
            Self::Bedroom => &BEDROOM,
            Self::DiningRoom => &DINING_ROOM,
            Self::Office => &OFFICE,
            Self::Kitchen => &KITCHEN,
        }
    }
}

/// Decor styles with their palette, material and price multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    Modern,
    Scandinavian,
    Classic,
    Industrial,
    Minimalist,
}

impl Style {
    pub const ALL: [Self; 5] = [
        Self::Modern,
        Self::Scandinavian,
        Self::Classic,
        Self::Industrial,
        Self::Minimalist,
    ];

    /// Parse a form value; anything unrecognised is Modern.
    #[must_use]
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim() {
            "Scandinavian" => Self::Scandinavian,
            "Classic" => Self::Classic,
            "Industrial" => Self::Industrial,
            "Minimalist" => Self::Minimalist,
            _ => Self::Modern,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Modern => "Modern",
            Self::Scandinavian => "Scandinavian",
            Self::Classic => "Classic",
            Self::Industrial => "Industrial",
            Self::Minimalist => "Minimalist",
        }
    }

    #[must_use]
    pub const fn palette(self) -> &'static [&'static str; 3] {
        match self {
            Self::Modern => &["White", "Black", "Gray"],
            Self::Scandinavian => &["Light Wood", "White", "Beige"],
            Self::Classic => &["Dark Wood", "Cream", "Gold"],
            Self::Industrial => &["Black", "Metal Gray", "Brown"],
            Self::Minimalist => &["White", "Light Gray", "Natural"],
        }
    }

    #[must_use]
    pub const fn material(self) -> &'static str {
        match self {
            Self::Modern => "Metal",
            Self::Scandinavian => "Pine Wood",
            Self::Classic => "Oak Wood",
            Self::Industrial => "Steel",
            Self::Minimalist => "Composite",
        }
    }

    #[must_use]
    pub const fn price_multiplier(self) -> Decimal {
        match self {
            Self::Modern => Decimal::from_parts(120, 0, 0, false, 2),
            Self::Scandinavian => Decimal::from_parts(110, 0, 0, false, 2),
            Self::Classic => Decimal::from_parts(130, 0, 0, false, 2),
            Self::Industrial => Decimal::from_parts(115, 0, 0, false, 2),
            Self::Minimalist => Decimal::ONE,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Modern => "clean lines, minimal decoration, and contemporary materials",
            Self::Scandinavian => "natural materials, light colors, and functional design",
            Self::Classic => "traditional elegance, rich materials, and timeless appeal",
            Self::Industrial => "raw materials, exposed elements, and urban aesthetics",
            Self::Minimalist => "simplicity, essential functionality, and uncluttered spaces",
        }
    }
}

/// Where a piece of furniture should go.
#[must_use]
pub fn placement_for(furniture: &str) -> &'static str {
    match furniture {
        "Sofa" => "Against the main wall facing the entertainment area",
        "Coffee Table" => "Center of the seating area",
        "Floor Lamp" => "In the corner next to seating for ambient lighting",
        "Bookshelf" => "Along the side wall for easy access",
        "Bed Frame" => "Centered against the largest wall",
        "Nightstand" => "Beside the bed for convenience",
        "Dresser" => "Opposite the bed or in the corner",
        "Table Lamp" => "On the nightstand for reading light",
        "Dining Table" => "Center of the dining area",
        "Dining Chairs" => "Around the dining table",
        "Sideboard" => "Against the wall for serving and storage",
        "Pendant Light" => "Above the dining table",
        "Desk" => "Near the window for natural light",
        "Office Chair" => "At the desk for optimal ergonomics",
        "Filing Cabinet" => "Beside or under the desk",
        "Desk Lamp" => "On the desk for task lighting",
        _ => "Positioned optimally within the room layout",
    }
}

/// A generated furniture suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub color: &'static str,
    pub material: &'static str,
    pub price: Money,
    pub placement: &'static str,
    pub category: &'static str,
}

impl Suggestion {
    /// Catalog search terms for finding real products, most specific first.
    #[must_use]
    pub fn search_terms(&self) -> [&str; 2] {
        [self.name.as_str(), self.category]
    }
}

/// Suggestions for one room in one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomAnalysis {
    pub room_type: RoomType,
    pub style: Style,
    pub suggestions: Vec<Suggestion>,
    pub total_cost: Money,
    pub style_analysis: String,
}

/// Generate the suggestion set for a room and style.
#[must_use]
pub fn analyze(room: RoomType, style: Style) -> RoomAnalysis {
    let palette = style.palette();
    let suggestions: Vec<Suggestion> = room
        .furniture()
        .iter()
        .enumerate()
        .map(|(i, furniture)| Suggestion {
            name: format!("{} {}", style.name(), furniture.name),
            color: palette.get(i % palette.len()).copied().unwrap_or("White"),
            material: style.material(),
            price: Money::new(Decimal::from(furniture.base_price))
                .scale(style.price_multiplier())
                .round_dollars(),
            placement: placement_for(furniture.name),
            category: furniture.category,
        })
        .collect();

    let total_cost = suggestions.iter().map(|s| s.price).sum();
    let style_analysis = format!(
        "This {} has been analyzed for {} style furniture. The space appears suitable for {} key \
         furniture pieces that will complement the room's layout and lighting. The {} style \
         emphasizes {}.",
        room.words(),
        style.name(),
        suggestions.len(),
        style.name(),
        style.description(),
    );

    RoomAnalysis {
        room_type: room,
        style,
        suggestions,
        total_cost,
        style_analysis,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_living_room() {
        let analysis = analyze(RoomType::LivingRoom, Style::Modern);
        let names: Vec<_> = analysis.suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Modern Sofa", "Modern Coffee Table", "Modern Floor Lamp", "Modern Bookshelf"]
        );
        let prices: Vec<_> = analysis.suggestions.iter().map(|s| s.price).collect();
        assert_eq!(
            prices,
            [
                Money::from_cents(71_900),
                Money::from_cents(35_900),
                Money::from_cents(17_900),
                Money::from_cents(23_900),
            ]
        );
        assert_eq!(analysis.total_cost, Money::from_cents(149_600));
        let colors: Vec<_> = analysis.suggestions.iter().map(|s| s.color).collect();
        assert_eq!(colors, ["White", "Black", "Gray", "White"]);
        assert!(analysis.suggestions.iter().all(|s| s.material == "Metal"));
        assert_eq!(
            analysis.suggestions[0].placement,
            "Against the main wall facing the entertainment area"
        );
    }

    #[test]
    fn test_style_analysis_sentence() {
        let analysis = analyze(RoomType::DiningRoom, Style::Scandinavian);
        assert_eq!(
            analysis.style_analysis,
            "This dining room has been analyzed for Scandinavian style furniture. The space \
             appears suitable for 4 key furniture pieces that will complement the room's layout \
             and lighting. The Scandinavian style emphasizes natural materials, light colors, \
             and functional design."
        );
    }

    #[test]
    fn test_industrial_rounding() {
        // 149 x 1.15 = 171.35, 129 x 1.15 = 148.35
        let analysis = analyze(RoomType::Kitchen, Style::Industrial);
        assert_eq!(analysis.suggestions[3].price, Money::from_cents(14_800));
        let bedroom = analyze(RoomType::LivingRoom, Style::Industrial);
        assert_eq!(bedroom.suggestions[2].price, Money::from_cents(17_100));
    }

    #[test]
    fn test_kitchen_uses_default_placement() {
        let analysis = analyze(RoomType::Kitchen, Style::Minimalist);
        assert!(
            analysis
                .suggestions
                .iter()
                .all(|s| s.placement == "Positioned optimally within the room layout")
        );
        assert_eq!(analysis.total_cost, Money::from_cents((899 + 99 + 299 + 129) * 100));
    }

    #[test]
    fn test_unknown_inputs_fall_back() {
        assert_eq!(RoomType::parse_or_default("garage"), RoomType::LivingRoom);
        assert_eq!(RoomType::parse_or_default("office"), RoomType::Office);
        assert_eq!(Style::parse_or_default("Boho"), Style::Modern);
        assert_eq!(Style::parse_or_default("Classic"), Style::Classic);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            analyze(RoomType::Bedroom, Style::Classic),
            analyze(RoomType::Bedroom, Style::Classic)
        );
    }

    #[test]
    fn test_search_terms() {
        let analysis = analyze(RoomType::Office, Style::Modern);
        assert_eq!(analysis.suggestions[1].search_terms(), ["Modern Office Chair", "Seating"]);
    }

    #[test]
    fn test_upload_checks() {
        let max = 5 * 1024 * 1024;
        assert_eq!(check_upload(Some("image/png"), 10, max), Ok(ImageKind::Png));
        assert_eq!(check_upload(Some("IMAGE/JPEG"), 10, max), Ok(ImageKind::Jpeg));
        assert_eq!(check_upload(Some("image/gif"), 10, max), Err(UploadError::UnsupportedType));
        assert_eq!(check_upload(None, 10, max), Err(UploadError::UnsupportedType));
        assert_eq!(check_upload(Some("image/webp"), 0, max), Err(UploadError::Missing));
        let err = check_upload(Some("image/webp"), max + 1, max).unwrap_err();
        assert_eq!(err.to_string(), "File size too large. Maximum size is 5MB");
    }
}
