use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info, warn};

use crate::db::models::ImageRecord;
use crate::handlers::form::{edit_record, prompt_image_id, validate_record};
use crate::handlers::render::{render_catalog, render_record, render_trace};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AddOptions {
    pub file: PathBuf,
    pub image_id: Option<String>,
    pub manual: bool,
    pub assume_yes: bool,
}

fn upload_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("{} has no file name", path.display()))
}

/// Fills the record from the vision model, or falls back to the manual
/// template whenever analysis is skipped, unavailable or fails.
async fn initial_record<W: Write>(
    state: &AppState,
    image_path: &Path,
    manual: bool,
    output: &mut W,
) -> Result<ImageRecord> {
    if manual {
        writeln!(output, "Manual entry selected.")?;
        return Ok(ImageRecord::manual_template());
    }
    if let Some(err) = state.extractor.configuration_error() {
        writeln!(
            output,
            "AI analysis unavailable ({err}). Continuing with manual entry."
        )?;
        return Ok(ImageRecord::manual_template());
    }

    writeln!(output, "AI is analyzing the image... This may take a moment.")?;
    let report = state.extractor.extract(image_path).await;
    write!(output, "{}", render_trace(&report.trace))?;

    match report.outcome {
        Ok(analysis) => {
            writeln!(output, "Metadata produced via {}.", analysis.tier)?;
            Ok(analysis.record)
        }
        Err(err) => {
            warn!("Extraction failed for {}: {err}", image_path.display());
            writeln!(output, "{err}. Continuing with manual entry.")?;
            Ok(ImageRecord::manual_template())
        }
    }
}

/// Upload, analyze (or enter manually), review, and save one image.
pub async fn add_command<R: BufRead, W: Write>(
    state: &AppState,
    options: &AddOptions,
    input: &mut R,
    output: &mut W,
) -> Result<ImageRecord> {
    let bytes = tokio::fs::read(&options.file)
        .await
        .with_context(|| format!("Failed to read {}", options.file.display()))?;
    let stored = state.images.save(&bytes, &upload_name(&options.file)?)?;
    writeln!(
        output,
        "Stored {} (thumbnail {})",
        stored.image_path.display(),
        stored.thumbnail_path.display()
    )?;

    let mut record = initial_record(state, &stored.image_path, options.manual, output).await?;
    if let Some(image_id) = options.image_id.as_deref() {
        record.image_id = image_id.trim().to_string();
    }
    let mut record = record.with_paths(
        &stored.image_path.to_string_lossy(),
        &stored.thumbnail_path.to_string_lossy(),
    );
    if let Some(previous) = record.normalize_image_type() {
        if !previous.trim().is_empty() {
            warn!("Unrecognised image_type {previous:?}; using {}", record.image_type);
            writeln!(
                output,
                "Image type '{previous}' is not a catalog type; using '{}'.",
                record.image_type
            )?;
        }
    }

    if options.assume_yes {
        validate_record(&record)
            .map_err(|err| anyhow!("{err}; pass --id to set one when using --yes"))?;
    } else {
        edit_record(&mut record, input, output)?;
        prompt_image_id(&mut record, input, output)?;
    }

    state.catalog.upsert(&record).await?;
    writeln!(
        output,
        "Successfully saved image '{}' to the catalog!",
        record.image_id
    )?;
    info!("add completed for image_id={}", record.image_id);
    Ok(record)
}

/// Runs extraction only. Returns `false` when no record was produced.
pub async fn analyze_command<W: Write>(state: &AppState, file: &Path, output: &mut W) -> Result<bool> {
    let report = state.extractor.extract(file).await;
    write!(output, "{}", render_trace(&report.trace))?;
    match report.outcome {
        Ok(analysis) => {
            debug!("Raw vision response: {}", analysis.raw_response);
            writeln!(output, "Result ({}):", analysis.tier)?;
            writeln!(
                output,
                "{}",
                serde_json::to_string_pretty(&analysis.record.content_json())?
            )?;
            Ok(true)
        }
        Err(err) => {
            writeln!(output, "{err}")?;
            Ok(false)
        }
    }
}

pub async fn list_command<W: Write>(state: &AppState, output: &mut W) -> Result<()> {
    let entries = state.catalog.list_all().await?;
    write!(output, "{}", render_catalog(&entries))?;
    Ok(())
}

/// Prints one record. Returns `false` when the id is unknown.
pub async fn show_command<W: Write>(state: &AppState, image_id: &str, output: &mut W) -> Result<bool> {
    match state.catalog.get(image_id).await? {
        Some(record) => {
            write!(output, "{}", render_record(&record))?;
            Ok(true)
        }
        None => {
            writeln!(output, "No image with id '{image_id}' in the catalog.")?;
            Ok(false)
        }
    }
}
