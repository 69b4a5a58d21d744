//! Prompt for document extraction

/// Builds the instruction prompt sent next to the document
pub struct PromptBuilder {
    original_name: String,
    mime_type: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        if !self.original_name.trim().is_empty() {
            prompt.push_str(&format!("File name: {}\n", self.original_name));
        }
        prompt.push_str(&format!("Content type: {}\n\n", self.mime_type));

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You read catering menus for events. The attached document is a menu.
Transcribe it and group it into services and sections.

Return a single JSON object with exactly this shape:
{
  "rawText": "full transcription of the document",
  "warnings": ["anything a reviewer should double check"],
  "detectedServices": [
    {
      "serviceType": "breakfast|coffee_break|lunch|afternoon_snack|dinner|cocktail|other",
      "startsAtGuess": "HH:MM or null",
      "paxGuess": 120,
      "formatGuess": "seated|standing",
      "sections": [
        {"title": "Entrantes", "items": ["Ensalada de temporada"]}
      ]
    }
  ]
}

Rules:
- One entry in detectedServices per service in the menu.
- Keep dish names exactly as written, one item per dish.
- Use null when the time or head count is not stated.
- Use "standing" only for receptions or cocktails served standing."#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Respond with the JSON object only. Do not use markdown, code fences or any commentary.";
