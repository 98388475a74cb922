use serde::{Deserialize, Serialize};

use crate::{domain::DiseaseLabel, error::ProtocolError};

/// Multipart field the classification endpoint reads the image from.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Body of a successful `POST /predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "class")]
    pub label: DiseaseLabel,
    pub confidence: f64,
}

impl ClassificationResult {
    pub fn new(label: DiseaseLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if (0.0..=1.0).contains(&self.confidence) {
            Ok(())
        } else {
            Err(ProtocolError::ConfidenceOutOfRange(self.confidence))
        }
    }
}
