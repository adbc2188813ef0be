use std::io::{BufRead, Write};

use anyhow::{anyhow, Result};

use crate::db::models::{ImageRecord, ImageType};
use crate::utils::text::clip;

const PREVIEW_CHARS: usize = 80;
const CLEAR_MARKER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordValidationError {
    #[error("Image ID must not be empty")]
    EmptyImageId,
}

/// The catalog key must be present before a record is written.
pub fn validate_record(record: &ImageRecord) -> Result<(), RecordValidationError> {
    if record.image_id.trim().is_empty() {
        return Err(RecordValidationError::EmptyImageId);
    }
    Ok(())
}

pub struct FormSection {
    pub title: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
}

pub const FORM_SECTIONS: [FormSection; 4] = [
    FormSection {
        title: "Core Identifiers",
        fields: &[
            ("image_id", "Image ID"),
            ("image_type", "Image Type"),
            ("style_name", "Style Name"),
        ],
    },
    FormSection {
        title: "Visual & Technical Specifications",
        fields: &[
            ("composition_structure", "Composition & Structure"),
            ("color_palette", "Color Palette"),
            ("lighting", "Lighting"),
            ("texture_finish", "Texture & Finish"),
            ("geometry_flow", "Geometry & Flow"),
        ],
    },
    FormSection {
        title: "Emotional & Narrative Framework",
        fields: &[
            ("primary_emotional_tone", "Primary Emotional Tone"),
            ("emotional_keyword_tags", "Emotional Keyword Tags"),
            ("narrative_metaphor", "Narrative or Metaphor"),
        ],
    },
    FormSection {
        title: "Usage & Recreation",
        fields: &[
            ("ai_generation_prompt", "AI Generation Prompt"),
            ("recreation_guidelines", "Recreation Guidelines"),
            ("recommended_use_cases", "Recommended Use Cases"),
        ],
    },
];

/// Reads one line; `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn edit_text_field<R: BufRead, W: Write>(
    label: &str,
    current: &mut String,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{label} [{}]: ", clip(current, PREVIEW_CHARS))?;
    output.flush()?;
    let Some(answer) = read_answer(input)? else {
        return Ok(false);
    };
    let trimmed = answer.trim();
    if trimmed == CLEAR_MARKER {
        current.clear();
    } else if !trimmed.is_empty() {
        *current = trimmed.to_string();
    }
    Ok(true)
}

fn edit_image_type<R: BufRead, W: Write>(
    current: &mut String,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    let selected = ImageType::parse(current).unwrap_or(ImageType::AiGenerated);
    *current = selected.as_str().to_string();
    loop {
        let options = ImageType::ALL
            .iter()
            .enumerate()
            .map(|(index, kind)| format!("{}) {}", index + 1, kind))
            .collect::<Vec<_>>()
            .join("  ");
        write!(output, "Image Type ({options}) [{selected}]: ")?;
        output.flush()?;
        let Some(answer) = read_answer(input)? else {
            return Ok(false);
        };
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        let choice = trimmed
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| ImageType::ALL.get(index).copied())
            .or_else(|| ImageType::parse(trimmed));
        match choice {
            Some(kind) => {
                *current = kind.as_str().to_string();
                return Ok(true);
            }
            None => writeln!(output, "Please choose 1 or 2.")?,
        }
    }
}

/// Walks every field of the form. An empty answer keeps the shown value and
/// `-` clears it. End of input keeps the remaining values as they are.
pub fn edit_record<R: BufRead, W: Write>(
    record: &mut ImageRecord,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(
        output,
        "Review the metadata. Press Enter to keep a value, '{CLEAR_MARKER}' to clear it."
    )?;
    for section in &FORM_SECTIONS {
        writeln!(output, "\n== {} ==", section.title)?;
        for (field, label) in section.fields {
            let slot = record
                .field_mut(field)
                .ok_or_else(|| anyhow!("Unknown form field {field}"))?;
            let answered = if *field == "image_type" {
                edit_image_type(slot, input, output)?
            } else {
                edit_text_field(label, slot, input, output)?
            };
            if !answered {
                writeln!(output)?;
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Asks for an image ID until a non-empty one is given.
pub fn prompt_image_id<R: BufRead, W: Write>(
    record: &mut ImageRecord,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    while let Err(err) = validate_record(record) {
        write!(output, "{err}. Image ID: ")?;
        output.flush()?;
        let Some(answer) = read_answer(input)? else {
            return Err(anyhow!(err));
        };
        record.image_id = answer.trim().to_string();
    }
    Ok(())
}
