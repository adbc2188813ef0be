use serde_json::{json, Value};

use crate::config::Config;

pub const SYSTEM_PROMPT: &str = r#"You are an expert brand asset analyst. Analyze the provided image and return a single, valid JSON object that catalogs it according to the schema below. Do not wrap the JSON in markdown code fences.

Required JSON schema:
{
  "image_id": "string (a short catalog identifier, e.g. AI-BG-001)",
  "image_type": "string ('AI-Generated' or 'Real Photograph')",
  "style_name": "string (a formal name for the aesthetic)",
  "composition_structure": "string (how the elements are arranged)",
  "color_palette": "string (primary, accent and neutral colors, with HEX codes where possible)",
  "lighting": "string (light source, style, shadows and contrast)",
  "texture_finish": "string (perceived surface quality, gloss or grain)",
  "geometry_flow": "string (dominant shapes, lines and perceived movement)",
  "primary_emotional_tone": "string (the main feeling the image evokes)",
  "emotional_keyword_tags": "string (comma-separated feeling keywords)",
  "narrative_metaphor": "string (the story or concept the image communicates)",
  "ai_generation_prompt": "string (if AI-generated, a descriptive prompt that would recreate it; otherwise N/A)",
  "recreation_guidelines": "string (key steps for a designer to reproduce the style)",
  "recommended_use_cases": "string (comma-separated practical applications, e.g. 'Website hero sections, Social media quotes')"
}"#;

pub const USER_INSTRUCTION: &str = "Please analyze this image and provide the JSON output.";

/// Generation parameters for the analysis request.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub json_mode: bool,
}

impl VisionSettings {
    pub fn from_config(config: &Config) -> Self {
        VisionSettings {
            model: config.vision_model.clone(),
            temperature: config.vision_temperature,
            max_tokens: config.vision_max_tokens,
            json_mode: config.vision_json_mode,
        }
    }
}

impl Default for VisionSettings {
    fn default() -> Self {
        VisionSettings {
            model: crate::config::DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            json_mode: true,
        }
    }
}

pub fn build_vision_payload(settings: &VisionSettings, image_data_uri: &str) -> Value {
    let mut payload = json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": USER_INSTRUCTION },
                    {
                        "type": "image_url",
                        "image_url": { "url": image_data_uri, "detail": "high" }
                    }
                ]
            }
        ],
        "temperature": settings.temperature,
        "max_tokens": settings.max_tokens,
    });
    if settings.json_mode {
        payload["response_format"] = json!({ "type": "json_object" });
    }
    payload
}
