use anyhow::anyhow;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::extract::extract_text;
use crate::intake::normalize::normalize_text;
use crate::intake::sanitize::sanitize_filename;
use crate::intake::signatures::{extension_matches_mime, SupportedKind};
use crate::intake::validator::validate;
use crate::state::AppState;

const FILE_FIELD: &str = "resume";
const TEXT_FIELD: &str = "resume_text";
const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    /// Sanitized client filename; absent for pasted text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// "pdf" | "docx" | "text"
    pub kind: &'static str,
    pub text: String,
    pub warnings: Vec<String>,
}

struct UploadedFile {
    bytes: Bytes,
    mime: String,
    filename: String,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    pasted_text: Option<String>,
}

/// POST /api/v1/resumes/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload_id = Uuid::new_v4();
    let span = info_span!("upload", %upload_id);

    process_upload(&state, upload_id, &mut multipart)
        .instrument(span)
        .await
        .map(Json)
}

async fn process_upload(
    state: &AppState,
    upload_id: Uuid,
    multipart: &mut Multipart,
) -> Result<UploadResponse, AppError> {
    let form = read_form(multipart).await?;

    if let Some(text) = form.pasted_text.filter(|t| !t.trim().is_empty()) {
        info!("using pasted resume text ({} chars)", text.len());
        return Ok(UploadResponse {
            upload_id,
            filename: None,
            kind: "text",
            text: normalize_text(&text),
            warnings: Vec::new(),
        });
    }

    let file = form
        .file
        .ok_or_else(|| AppError::BadRequest("No resume provided".to_string()))?;

    ingest_file(state, upload_id, file).await
}

async fn ingest_file(
    state: &AppState,
    upload_id: Uuid,
    file: UploadedFile,
) -> Result<UploadResponse, AppError> {
    let options = state.config.validation_options();
    let verdict = validate(&file.bytes, &file.mime, &file.filename, &options);

    if !verdict.is_valid() {
        let reason = verdict.error().unwrap_or("File rejected").to_string();
        info!(
            "rejected {}-byte upload declared {}: {reason}",
            file.bytes.len(),
            file.mime
        );
        return Err(AppError::Validation(reason));
    }

    let mut warnings = verdict.warnings().to_vec();
    if !extension_matches_mime(&file.filename, &file.mime) {
        warnings.push("File extension does not match declared content type".to_string());
    }
    for w in &warnings {
        warn!("{w}");
    }

    let kind = SupportedKind::from_mime(&file.mime)
        .ok_or_else(|| anyhow!("accepted upload has unsupported mime {}", file.mime))?;

    let raw = extract_text(
        state.extractor.as_ref(),
        file.bytes,
        kind,
        state.config.extraction_timeout(),
    )
    .await?;

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(AppError::Validation(
            "No readable text found in the uploaded file".to_string(),
        ));
    }

    info!("extracted {} chars from {kind}", text.len());
    Ok(UploadResponse {
        upload_id,
        filename: Some(sanitize_filename(&file.filename)),
        kind: kind.as_str(),
        text,
        warnings,
    })
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let mime = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                form.file = Some(UploadedFile {
                    bytes,
                    mime,
                    filename,
                });
            }
            TEXT_FIELD => {
                form.pasted_text = Some(field.text().await?);
            }
            _ => {}
        }
    }

    Ok(form)
}
