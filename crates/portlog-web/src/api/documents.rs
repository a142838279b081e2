use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use portlog_core::{DocumentFormat, DocumentSet, Event, UnifiedRecord};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "Files processed successfully!";

const SOF_FIELD: &str = "sof_file";
const CP_FIELD: &str = "cp_file";
const ADDITIONAL_FIELD: &str = "additional_file";

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub message: &'static str,
    pub processed_data: Vec<UnifiedRecord>,
    pub events: Vec<Event>,
}

struct Upload {
    file_name: String,
    data: Vec<u8>,
}

#[derive(Default)]
struct Uploads {
    sof: Option<Upload>,
    cp: Option<Upload>,
    additional: Option<Upload>,
}

impl Uploads {
    fn all(&self) -> impl Iterator<Item = &Upload> {
        self.sof.iter().chain(self.cp.iter()).chain(self.additional.iter())
    }
}

/// Files written to the upload directory for one request. They are removed
/// when this is dropped, whatever the outcome of processing.
struct StagedFiles {
    paths: Vec<PathBuf>,
}

impl StagedFiles {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    fn stage(&mut self, dir: &Path, upload: &Upload) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{}_{}", Uuid::new_v4(), upload.file_name));
        std::fs::write(&path, &upload.data)?;
        self.paths.push(path.clone());
        Ok(path)
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove staged upload"
                );
            }
        }
    }
}

/// Keep only the final path component of a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

async fn read_uploads(multipart: &mut Multipart) -> ApiResult<Uploads> {
    let mut uploads = Uploads::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = match name.as_str() {
            SOF_FIELD => &mut uploads.sof,
            CP_FIELD => &mut uploads.cp,
            ADDITIONAL_FIELD => &mut uploads.additional,
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
                continue;
            }
        };

        let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?;

        // Browsers send an empty part for optional file inputs left blank.
        if file_name.is_empty() && data.is_empty() {
            continue;
        }

        tracing::info!(field = %name, file = %file_name, bytes = data.len(), "Received upload");
        *slot = Some(Upload {
            file_name,
            data: data.to_vec(),
        });
    }

    Ok(uploads)
}

/// POST /api/process-documents/
pub async fn process_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProcessResponse>> {
    let request_id = Uuid::new_v4().to_string();
    let uploads = read_uploads(&mut multipart).await?;

    if uploads.sof.is_none() {
        return Err(ApiError::MissingField(SOF_FIELD));
    }
    for upload in uploads.all() {
        DocumentFormat::from_path(Path::new(&upload.file_name))?;
    }

    let pipeline = state.pipeline.clone();
    let dump = state.dump.clone();
    let upload_dir = state.config.upload_dir.clone();
    let task_request_id = request_id.clone();

    let out = tokio::task::spawn_blocking(move || -> ApiResult<_> {
        std::fs::create_dir_all(&upload_dir)?;
        let mut staged = StagedFiles::new();

        let stage = |staged: &mut StagedFiles, upload: Option<&Upload>| {
            upload.map(|u| staged.stage(&upload_dir, u)).transpose()
        };
        let sof = stage(&mut staged, uploads.sof.as_ref())?
            .ok_or(ApiError::MissingField(SOF_FIELD))?;
        let set = DocumentSet {
            sof,
            cp: stage(&mut staged, uploads.cp.as_ref())?,
            additional: stage(&mut staged, uploads.additional.as_ref())?,
        };

        let out = pipeline.process(&set)?;
        drop(staged);

        if let Some(sink) = dump {
            sink.dump(&task_request_id, &out.records);
        }
        Ok(out)
    })
    .await
    .map_err(|e| ApiError::internal(format!("processing task failed: {e}")))??;

    tracing::info!(
        request_id = %request_id,
        records = out.records.len(),
        events = out.events.len(),
        duration_ms = out.duration_ms,
        "Documents processed"
    );

    Ok(Json(ProcessResponse {
        message: SUCCESS_MESSAGE,
        processed_data: out.records,
        events: out.events,
    }))
}
