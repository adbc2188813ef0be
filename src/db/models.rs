use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Column order of the `images` table. Writes bind values in this order.
pub const RECORD_COLUMNS: [&str; 16] = [
    "image_id",
    "image_path",
    "image_thumbnail",
    "image_type",
    "style_name",
    "composition_structure",
    "color_palette",
    "lighting",
    "texture_finish",
    "geometry_flow",
    "primary_emotional_tone",
    "emotional_keyword_tags",
    "narrative_metaphor",
    "ai_generation_prompt",
    "recreation_guidelines",
    "recommended_use_cases",
];

/// Fields the vision model is asked to fill. Paths are attached by the
/// workflow after the upload is stored.
pub const CONTENT_FIELDS: [&str; 14] = [
    "image_id",
    "image_type",
    "style_name",
    "composition_structure",
    "color_palette",
    "lighting",
    "texture_finish",
    "geometry_flow",
    "primary_emotional_tone",
    "emotional_keyword_tags",
    "narrative_metaphor",
    "ai_generation_prompt",
    "recreation_guidelines",
    "recommended_use_cases",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    AiGenerated,
    RealPhotograph,
}

impl ImageType {
    pub const ALL: [ImageType; 2] = [ImageType::AiGenerated, ImageType::RealPhotograph];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::AiGenerated => "AI-Generated",
            ImageType::RealPhotograph => "Real Photograph",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let lowered = value.trim().to_lowercase();
        match lowered.as_str() {
            "ai-generated" | "ai generated" | "ai" => Some(ImageType::AiGenerated),
            "real photograph" | "real-photograph" | "real" | "photo" => {
                Some(ImageType::RealPhotograph)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageRecord {
    pub image_id: String,
    pub image_path: String,
    pub image_thumbnail: String,
    pub image_type: String,
    pub style_name: String,
    pub composition_structure: String,
    pub color_palette: String,
    pub lighting: String,
    pub texture_finish: String,
    pub geometry_flow: String,
    pub primary_emotional_tone: String,
    pub emotional_keyword_tags: String,
    pub narrative_metaphor: String,
    pub ai_generation_prompt: String,
    pub recreation_guidelines: String,
    pub recommended_use_cases: String,
}

fn json_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(json_to_text)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

impl ImageRecord {
    /// Blank form used for manual entry.
    pub fn manual_template() -> Self {
        ImageRecord {
            image_type: ImageType::AiGenerated.as_str().to_string(),
            ..ImageRecord::default()
        }
    }

    /// Builds a complete record from a parsed JSON object. Missing keys
    /// become empty strings and non-string values are rendered as text.
    /// Keys outside the schema are ignored.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut record = ImageRecord::default();
        for column in RECORD_COLUMNS {
            if let Some(value) = map.get(column) {
                if let Some(slot) = record.field_mut(column) {
                    *slot = json_to_text(value);
                }
            }
        }
        record
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "image_id" => &self.image_id,
            "image_path" => &self.image_path,
            "image_thumbnail" => &self.image_thumbnail,
            "image_type" => &self.image_type,
            "style_name" => &self.style_name,
            "composition_structure" => &self.composition_structure,
            "color_palette" => &self.color_palette,
            "lighting" => &self.lighting,
            "texture_finish" => &self.texture_finish,
            "geometry_flow" => &self.geometry_flow,
            "primary_emotional_tone" => &self.primary_emotional_tone,
            "emotional_keyword_tags" => &self.emotional_keyword_tags,
            "narrative_metaphor" => &self.narrative_metaphor,
            "ai_generation_prompt" => &self.ai_generation_prompt,
            "recreation_guidelines" => &self.recreation_guidelines,
            "recommended_use_cases" => &self.recommended_use_cases,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "image_id" => &mut self.image_id,
            "image_path" => &mut self.image_path,
            "image_thumbnail" => &mut self.image_thumbnail,
            "image_type" => &mut self.image_type,
            "style_name" => &mut self.style_name,
            "composition_structure" => &mut self.composition_structure,
            "color_palette" => &mut self.color_palette,
            "lighting" => &mut self.lighting,
            "texture_finish" => &mut self.texture_finish,
            "geometry_flow" => &mut self.geometry_flow,
            "primary_emotional_tone" => &mut self.primary_emotional_tone,
            "emotional_keyword_tags" => &mut self.emotional_keyword_tags,
            "narrative_metaphor" => &mut self.narrative_metaphor,
            "ai_generation_prompt" => &mut self.ai_generation_prompt,
            "recreation_guidelines" => &mut self.recreation_guidelines,
            "recommended_use_cases" => &mut self.recommended_use_cases,
            _ => return None,
        };
        Some(value)
    }

    /// The fourteen model-produced fields, in schema order.
    pub fn content_fields(&self) -> Vec<(&'static str, &str)> {
        CONTENT_FIELDS
            .iter()
            .map(|name| (*name, self.field(name).unwrap_or_default()))
            .collect()
    }

    /// JSON object holding only the content fields.
    pub fn content_json(&self) -> Value {
        let map = self
            .content_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect::<Map<_, _>>();
        Value::Object(map)
    }

    /// Maps `image_type` onto one of the two catalog labels, defaulting to
    /// AI-Generated. Returns the previous value when it was not recognised.
    pub fn normalize_image_type(&mut self) -> Option<String> {
        match ImageType::parse(&self.image_type) {
            Some(kind) => {
                self.image_type = kind.as_str().to_string();
                None
            }
            None => Some(std::mem::replace(
                &mut self.image_type,
                ImageType::AiGenerated.as_str().to_string(),
            )),
        }
    }

    pub fn with_paths(mut self, image_path: &str, image_thumbnail: &str) -> Self {
        self.image_path = image_path.to_string();
        self.image_thumbnail = image_thumbnail.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CatalogEntry {
    pub image_id: String,
    pub style_name: Option<String>,
    pub image_type: Option<String>,
    pub image_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_become_empty_strings() {
        let value = json!({ "image_id": "AI-001", "style_name": "Dreamcore" });
        let record = ImageRecord::from_json_map(value.as_object().unwrap());
        assert_eq!(record.image_id, "AI-001");
        assert_eq!(record.style_name, "Dreamcore");
        assert_eq!(record.lighting, "");
        assert_eq!(record.image_path, "");
    }

    #[test]
    fn non_string_values_are_rendered_as_text() {
        let value = json!({
            "emotional_keyword_tags": ["calm", "nostalgic", ""],
            "geometry_flow": null,
            "lighting": 3,
            "texture_finish": true
        });
        let record = ImageRecord::from_json_map(value.as_object().unwrap());
        assert_eq!(record.emotional_keyword_tags, "calm, nostalgic");
        assert_eq!(record.geometry_flow, "");
        assert_eq!(record.lighting, "3");
        assert_eq!(record.texture_finish, "true");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let value = json!({ "image_id": "X", "camera": "Leica" });
        let record = ImageRecord::from_json_map(value.as_object().unwrap());
        assert_eq!(record.content_json().as_object().unwrap().len(), 14);
        assert!(record.content_json().get("camera").is_none());
    }

    #[test]
    fn image_type_accepts_labels_and_shorthands() {
        assert_eq!(ImageType::parse("AI-Generated"), Some(ImageType::AiGenerated));
        assert_eq!(ImageType::parse(" real photograph "), Some(ImageType::RealPhotograph));
        assert_eq!(ImageType::parse("real"), Some(ImageType::RealPhotograph));
        assert_eq!(ImageType::parse("painting"), None);
    }

    #[test]
    fn image_type_is_normalized_to_a_catalog_label() {
        let mut record = ImageRecord {
            image_type: "photo".to_string(),
            ..ImageRecord::default()
        };
        assert_eq!(record.normalize_image_type(), None);
        assert_eq!(record.image_type, "Real Photograph");

        record.image_type = "Oil painting".to_string();
        assert_eq!(record.normalize_image_type().as_deref(), Some("Oil painting"));
        assert_eq!(record.image_type, "AI-Generated");
    }

    #[test]
    fn field_names_cover_every_column() {
        let mut record = ImageRecord::default();
        for column in RECORD_COLUMNS {
            *record.field_mut(column).unwrap() = column.to_uppercase();
        }
        for column in RECORD_COLUMNS {
            assert_eq!(record.field(column), Some(column.to_uppercase().as_str()));
        }
        assert!(record.field("camera").is_none());
    }
}
