//! Heuristic extraction from plain text
//!
//! Line classification plus keyword/regex field detection.
//!
//! Known misclassifications:
//! - any line equal to its own upper-cased form is a header, so numeric or
//!   symbol-only lines (`"25"`, `"---"`) and short all-caps items (`"IVA"`)
//!   open sections;
//! - keyword matching is substring based (`"escena"` contains `"cena"`);
//! - prices such as `12.50` read as a start time when no real time precedes
//!   them.

use menudraft_domain::{Draft, DraftSection, DraftService, ServiceFormat, ServiceType};
use regex::Regex;
use std::sync::LazyLock;

/// Title of the section collecting items seen before any header
pub const DEFAULT_SECTION_TITLE: &str = "General";

/// Service keywords in priority order; the first list with a hit wins
const SERVICE_KEYWORDS: &[(ServiceType, &[&str])] = &[
    (ServiceType::Breakfast, &["desayuno", "breakfast"]),
    (ServiceType::CoffeeBreak, &["coffee"]),
    (ServiceType::Lunch, &["almuerzo", "comida", "lunch"]),
    (ServiceType::AfternoonSnack, &["merienda", "snack"]),
    (ServiceType::Dinner, &["cena", "dinner"]),
    (ServiceType::Cocktail, &["coctel", "cóctel", "cocktail"]),
];

const STANDING_KEYWORDS: &[&str] = &["de pie", "standing", "coctel", "cóctel", "cocktail"];

static PAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{2,4})\s*(pax|personas|people|invitados|comensales|guests)")
        .expect("pax pattern is a valid regex")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3])[:.]([0-5]\d)\b").expect("time pattern is a valid regex")
});

/// Build a draft from plain text. Always succeeds.
///
/// Produces exactly one guessed service holding every section found.
pub fn extract_from_text(text: &str) -> Draft {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let sections = split_sections(&lines);
    let joined = lines.join("\n");

    Draft {
        raw_text: text.to_string(),
        warnings: Vec::new(),
        detected_services: vec![DraftService {
            service_type: detect_service_type(&joined),
            starts_at_guess: detect_start(&joined),
            pax_guess: detect_pax(&joined),
            format_guess: detect_format(&joined),
            sections,
        }],
    }
}

/// Whether a trimmed line reads as a section header
///
/// A header ends with `:` or is already upper case.
pub fn is_section_header(line: &str) -> bool {
    line.ends_with(':') || line == line.to_uppercase()
}

fn header_title(line: &str) -> String {
    line.strip_suffix(':').unwrap_or(line).trim().to_string()
}

fn split_sections(lines: &[&str]) -> Vec<DraftSection> {
    let mut sections = Vec::new();
    let mut current = DraftSection::new(DEFAULT_SECTION_TITLE);
    let mut current_is_default = true;

    for line in lines {
        if is_section_header(line) {
            if !current.items.is_empty() || !current_is_default {
                sections.push(current);
            }
            current = DraftSection::new(header_title(line));
            current_is_default = false;
        } else {
            current.items.push((*line).to_string());
        }
    }

    if !current.items.is_empty() || sections.is_empty() {
        sections.push(current);
    }

    sections
}

/// Guess the service type from keywords (case-insensitive, first match wins)
pub fn detect_service_type(text: &str) -> ServiceType {
    let lower = text.to_lowercase();
    SERVICE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(service_type, _)| *service_type)
        .unwrap_or(ServiceType::Other)
}

/// First head count written as `<2-4 digits> pax|personas|...`
pub fn detect_pax(text: &str) -> Option<u32> {
    PAX_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// First `H:MM`, `HH:MM` or `HH.MM` token, normalised to `HH:MM`
pub fn detect_start(text: &str) -> Option<String> {
    let caps = TIME_RE.captures(text)?;
    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute = caps.get(2)?.as_str();
    Some(format!("{:02}:{}", hour, minute))
}

/// `Standing` when a standing or cocktail keyword appears, else `Seated`
pub fn detect_format(text: &str) -> ServiceFormat {
    let lower = text.to_lowercase();
    if STANDING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ServiceFormat::Standing
    } else {
        ServiceFormat::Seated
    }
}
