//! Multipart training uploads.

use axum::extract::Multipart;
use polars::prelude::DataFrame;
use tracing::debug;
use treeline_learning::TrainConfig;
use treeline_processing::{FrameFormat, read_frame_from_bytes};

use crate::error::ApiError;

/// Name of the multipart part carrying the dataset.
pub const FILE_PART: &str = "file";

/// Name of the multipart part carrying the JSON `TrainConfig`.
pub const CONFIG_PART: &str = "config";

/// A decoded `POST /train` body.
#[derive(Debug)]
pub struct TrainUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub config: TrainConfig,
}

impl TrainUpload {
    /// Collect the `file` and `config` parts; other parts are ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file: Option<(String, Vec<u8>)> = None;
        let mut config_text: Option<String> = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                FILE_PART => {
                    let file_name = field.file_name().unwrap_or("data.csv").to_string();
                    let bytes = field.bytes().await?;
                    debug!("Received file part '{}' ({} bytes)", file_name, bytes.len());
                    file = Some((file_name, bytes.to_vec()));
                }
                CONFIG_PART => {
                    config_text = Some(field.text().await?);
                }
                other => debug!("Ignoring multipart part '{}'", other),
            }
        }

        let (file_name, data) =
            file.ok_or_else(|| ApiError::BadRequest(format!("missing '{FILE_PART}' part")))?;
        let config_text = config_text
            .ok_or_else(|| ApiError::BadRequest(format!("missing '{CONFIG_PART}' part")))?;
        let config = TrainConfig::from_json(&config_text)?;

        Ok(Self {
            file_name,
            data,
            config,
        })
    }

    /// Parse the uploaded bytes; `.parquet` names are read as Parquet, the
    /// rest as CSV.
    pub fn read_frame(&self) -> Result<DataFrame, ApiError> {
        let format = FrameFormat::from_file_name(&self.file_name);
        read_frame_from_bytes(&self.data, format).map_err(ApiError::InvalidUpload)
    }
}
