//! Draft module - the structured result an extraction job produces

use serde::{Deserialize, Serialize};
use std::fmt;

/// Warning attached to every placeholder draft
pub const FALLBACK_WARNING: &str = "extraction unavailable, requires manual review";

/// Section title used by the placeholder draft
pub const FALLBACK_SECTION_TITLE: &str = "OCR";

/// Item used by the placeholder draft when the attachment has no name
pub const FALLBACK_ITEM: &str = "review menu";

/// Kind of catering service a menu describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Morning service
    Breakfast,
    /// Mid-morning or mid-afternoon break
    CoffeeBreak,
    /// Midday meal
    Lunch,
    /// Late afternoon snack
    AfternoonSnack,
    /// Evening meal
    Dinner,
    /// Standing reception
    Cocktail,
    /// Anything the detectors could not place
    Other,
}

impl ServiceType {
    /// Get the service type as its wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Breakfast => "breakfast",
            ServiceType::CoffeeBreak => "coffee_break",
            ServiceType::Lunch => "lunch",
            ServiceType::AfternoonSnack => "afternoon_snack",
            ServiceType::Dinner => "dinner",
            ServiceType::Cocktail => "cocktail",
            ServiceType::Other => "other",
        }
    }

    /// Parse a service type leniently.
    ///
    /// Accepts the canonical names plus the Spanish vocabulary generative
    /// models tend to answer with. Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "breakfast" | "desayuno" => Some(ServiceType::Breakfast),
            "coffee_break" | "coffee" | "coffeebreak" => Some(ServiceType::CoffeeBreak),
            "lunch" | "almuerzo" | "comida" => Some(ServiceType::Lunch),
            "afternoon_snack" | "merienda" | "snack" => Some(ServiceType::AfternoonSnack),
            "dinner" | "cena" => Some(ServiceType::Dinner),
            "cocktail" | "coctel" | "cóctel" | "barra_libre" => Some(ServiceType::Cocktail),
            "other" | "otros" | "otro" => Some(ServiceType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How guests are served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFormat {
    /// Guests sit at tables
    #[default]
    Seated,
    /// Guests stand (cocktail or reception style)
    Standing,
}

impl ServiceFormat {
    /// Get the format as its wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceFormat::Seated => "seated",
            ServiceFormat::Standing => "standing",
        }
    }

    /// Parse a format leniently (canonical or Spanish names)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "seated" | "sentado" | "buffet" => Some(ServiceFormat::Seated),
            "standing" | "de_pie" => Some(ServiceFormat::Standing),
            _ => None,
        }
    }
}

/// A titled group of menu lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSection {
    /// Section heading (e.g. "Entrantes")
    pub title: String,
    /// Menu lines under the heading
    pub items: Vec<String>,
}

impl DraftSection {
    /// Create an empty section with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }
}

/// One guessed service inside a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftService {
    /// Detected kind of service
    pub service_type: ServiceType,
    /// Start time as "HH:MM", when one was found
    pub starts_at_guess: Option<String>,
    /// Head count, when one was found
    pub pax_guess: Option<u32>,
    /// Seated or standing
    pub format_guess: ServiceFormat,
    /// Menu sections for this service
    pub sections: Vec<DraftSection>,
}

/// Structured extraction result reviewed by editors before it is applied
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    /// Text the draft was derived from
    pub raw_text: String,
    /// Reviewer-facing notes about extraction quality
    pub warnings: Vec<String>,
    /// Guessed services; never empty once a job is done
    pub detected_services: Vec<DraftService>,
}

impl Draft {
    /// Whether the draft carries at least one service
    pub fn has_services(&self) -> bool {
        !self.detected_services.is_empty()
    }
}

/// Placeholder service used when no real extraction is available
pub fn fallback_service(original_name: &str) -> DraftService {
    let item = if original_name.trim().is_empty() {
        FALLBACK_ITEM.to_string()
    } else {
        original_name.to_string()
    };

    DraftService {
        service_type: ServiceType::Other,
        starts_at_guess: None,
        pax_guess: None,
        format_guess: ServiceFormat::Seated,
        sections: vec![DraftSection {
            title: FALLBACK_SECTION_TITLE.to_string(),
            items: vec![item],
        }],
    }
}

/// Build the placeholder draft for an attachment that could not be read.
///
/// The result is a successful outcome: one `other` service whose only
/// section lists the attachment name, flagged for manual review.
pub fn build_fallback_draft(original_name: &str) -> Draft {
    Draft {
        raw_text: String::new(),
        warnings: vec![FALLBACK_WARNING.to_string()],
        detected_services: vec![fallback_service(original_name)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_draft_shape() {
        let draft = build_fallback_draft("menu.pdf");
        assert_eq!(draft.raw_text, "");
        assert_eq!(draft.warnings, vec![FALLBACK_WARNING.to_string()]);
        assert_eq!(draft.detected_services.len(), 1);

        let service = &draft.detected_services[0];
        assert_eq!(service.service_type, ServiceType::Other);
        assert_eq!(service.starts_at_guess, None);
        assert_eq!(service.pax_guess, None);
        assert_eq!(service.format_guess, ServiceFormat::Seated);
        assert_eq!(
            service.sections,
            vec![DraftSection {
                title: "OCR".to_string(),
                items: vec!["menu.pdf".to_string()],
            }]
        );
    }

    #[test]
    fn test_fallback_draft_without_name() {
        let draft = build_fallback_draft("  ");
        assert_eq!(draft.detected_services[0].sections[0].items, vec!["review menu"]);
    }

    #[test]
    fn test_service_type_parse_aliases() {
        assert_eq!(ServiceType::parse("cena"), Some(ServiceType::Dinner));
        assert_eq!(ServiceType::parse("Coffee Break"), Some(ServiceType::CoffeeBreak));
        assert_eq!(ServiceType::parse("barra_libre"), Some(ServiceType::Cocktail));
        assert_eq!(ServiceType::parse("otros"), Some(ServiceType::Other));
        assert_eq!(ServiceType::parse("brunch"), None);
    }

    #[test]
    fn test_service_format_parse_aliases() {
        assert_eq!(ServiceFormat::parse("de_pie"), Some(ServiceFormat::Standing));
        assert_eq!(ServiceFormat::parse("de pie"), Some(ServiceFormat::Standing));
        assert_eq!(ServiceFormat::parse("buffet"), Some(ServiceFormat::Seated));
        assert_eq!(ServiceFormat::parse("floating"), None);
    }

    #[test]
    fn test_draft_json_uses_camel_case() {
        let json = serde_json::to_value(build_fallback_draft("carta.jpg")).unwrap();
        assert_eq!(json["rawText"], "");
        assert_eq!(json["detectedServices"][0]["serviceType"], "other");
        assert_eq!(json["detectedServices"][0]["formatGuess"], "seated");
        assert!(json["detectedServices"][0]["startsAtGuess"].is_null());
        assert!(json["detectedServices"][0]["paxGuess"].is_null());
        assert_eq!(json["detectedServices"][0]["sections"][0]["title"], "OCR");
    }
}
