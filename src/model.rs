use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::config::EnvConfig;
use crate::error::ApiError;
use crate::preprocess::IMAGE_SIZE;

/// Pretrained benign/malignant classifier backed by a single ONNX
/// artifact. The plan is immutable after loading and safe to share across
/// concurrent forward passes.
#[derive(Debug)]
pub struct Classifier {
    plan: TypedSimplePlan<TypedModel>,
}

impl Classifier {
    pub fn load(path: &str) -> TractResult<Self> {
        let size = IMAGE_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, size, size, 3)),
            )?
            .into_optimized()?
            .into_runnable()?;
        Ok(Self { plan })
    }

    /// One forward pass. The artifact ends in a sigmoid, so the output is
    /// a single scalar in [0, 1]; anything else is an internal error.
    pub fn predict(&self, input: Array4<f32>) -> Result<f32, ApiError> {
        let size = IMAGE_SIZE as usize;
        let tensor = tract_ndarray::Array4::from_shape_vec((1, size, size, 3), input.into_raw_vec())
            .map_err(|e| ApiError::Internal(format!("Bad input tensor shape: {}", e)))?
            .into_tensor();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ApiError::Internal(format!("Inference failed: {}", e)))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ApiError::Internal(format!("Unexpected output type: {}", e)))?;
        let mut scalars = view.iter().copied();
        match (scalars.next(), scalars.next()) {
            (Some(score), None) => Ok(score),
            _ => Err(ApiError::Internal(format!(
                "Expected a single sigmoid output, got {} values",
                view.len()
            ))),
        }
    }
}

/// Shared application state: the model handle, loaded once at startup and
/// read-only for the life of the process.
pub struct AppState {
    classifier: Option<Classifier>,
}

impl AppState {
    /// A failed load leaves the service up; predictions then answer with
    /// ModelUnavailable until the process restarts with a valid artifact.
    pub fn initialize(config: &EnvConfig) -> Self {
        match Classifier::load(&config.model_path) {
            Ok(classifier) => {
                log::info!("Model loaded from {}", config.model_path);
                Self {
                    classifier: Some(classifier),
                }
            }
            Err(e) => {
                log::error!("Error loading model from {}: {}", config.model_path, e);
                Self { classifier: None }
            }
        }
    }

    pub fn classifier(&self) -> Result<&Classifier, ApiError> {
        self.classifier.as_ref().ok_or(ApiError::ModelUnavailable)
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.is_some()
    }
}
