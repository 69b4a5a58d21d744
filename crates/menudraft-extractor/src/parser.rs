//! Parse model output into a draft

use crate::error::ExtractorError;
use crate::heuristic::{detect_start, DEFAULT_SECTION_TITLE};
use menudraft_domain::{Draft, DraftSection, DraftService, ServiceFormat, ServiceType};
use serde_json::{Map, Value};
use tracing::warn;

/// Remove markdown code-fence markers the model may wrap its answer in
pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a model response into a draft.
///
/// The response must be a JSON object. Missing or malformed fields are
/// normalised rather than rejected; invalid services are skipped. When the
/// object has no `rawText`, the first `excerpt_chars` characters of the
/// response stand in for it.
pub fn parse_llm_response(response: &str, excerpt_chars: usize) -> Result<Draft, ExtractorError> {
    let json_str = strip_code_fences(response);
    let json: Value = serde_json::from_str(&json_str)?;

    let obj = json
        .as_object()
        .ok_or_else(|| ExtractorError::InvalidFormat("Expected JSON object".to_string()))?;

    let raw_text = field(obj, "rawText", "raw_text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.chars().take(excerpt_chars).collect());

    let warnings = field(obj, "warnings", "warnings")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut detected_services = Vec::new();
    if let Some(services) = field(obj, "detectedServices", "detected_services").and_then(Value::as_array) {
        for (idx, service_json) in services.iter().enumerate() {
            match parse_service_json(service_json) {
                Ok(service) => detected_services.push(service),
                Err(e) => warn!("Skipping detected service {}: {}", idx, e),
            }
        }
    }

    Ok(Draft {
        raw_text,
        warnings,
        detected_services,
    })
}

/// Look a field up under its camelCase name, then its snake_case name
fn field<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    obj.get(camel).or_else(|| obj.get(snake)).filter(|v| !v.is_null())
}

fn parse_service_json(json: &Value) -> Result<DraftService, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Service is not a JSON object".to_string())?;

    let service_type = field(obj, "serviceType", "service_type")
        .and_then(Value::as_str)
        .and_then(ServiceType::parse)
        .unwrap_or(ServiceType::Other);

    let starts_at_guess = field(obj, "startsAtGuess", "starts_at_guess")
        .and_then(Value::as_str)
        .and_then(detect_start);

    let pax_guess = field(obj, "paxGuess", "pax_guess").and_then(parse_pax);

    let format_guess = field(obj, "formatGuess", "format_guess")
        .and_then(Value::as_str)
        .and_then(ServiceFormat::parse)
        .unwrap_or_default();

    let sections = field(obj, "sections", "sections")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_section_json).collect())
        .unwrap_or_default();

    Ok(DraftService {
        service_type,
        starts_at_guess,
        pax_guess,
        format_guess,
        sections,
    })
}

fn parse_pax(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_section_json(json: &Value) -> Option<DraftSection> {
    let obj = json.as_object()?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SECTION_TITLE)
        .to_string();

    let items = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(DraftSection { title, items })
}
