use axum::Json;
use axum::extract::{Multipart, Query};
use serde::Deserialize;
use tracing::info;
use treeline_learning::{ClientLanguage, Trainer, TrainingResult, generate_client};

use crate::error::ApiError;
use crate::upload::TrainUpload;

/// Query string of `POST /train`.
#[derive(Debug, Default, Deserialize)]
pub struct TrainQuery {
    /// Language of a client module to generate alongside the model.
    pub client: Option<String>,
}

/// `POST /train`
///
/// Reads the dataset and configuration from the multipart body and runs the
/// training on a blocking worker.
pub async fn train(
    Query(query): Query<TrainQuery>,
    multipart: Multipart,
) -> Result<Json<TrainingResult>, ApiError> {
    let language = query
        .client
        .as_deref()
        .map(str::parse::<ClientLanguage>)
        .transpose()?;

    let upload = TrainUpload::from_multipart(multipart).await?;
    info!(
        "Training request: file '{}', target '{}', task {}",
        upload.file_name, upload.config.target_column, upload.config.task_type
    );

    let result = tokio::task::spawn_blocking(move || run_training(&upload, language))
        .await
        .map_err(|e| ApiError::TaskFailed(e.to_string()))??;

    Ok(Json(result))
}

fn run_training(
    upload: &TrainUpload,
    language: Option<ClientLanguage>,
) -> Result<TrainingResult, ApiError> {
    let df = upload.read_frame()?;
    let trainer = Trainer::new(upload.config.clone())?;
    let mut result = trainer.train(&df)?;

    if let Some(language) = language {
        result.artifacts.client_module = Some(generate_client(language, &result)?);
    }
    Ok(result)
}
