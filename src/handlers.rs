use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::ApiError;
use crate::model::AppState;
use crate::models::{HealthResponse, PredictionResponse};
use crate::preprocess;

/// `POST /predict/` — multipart form with an image in the `file` field.
pub async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    // Fail fast before draining the upload.
    state.classifier()?;

    let request_id = Uuid::new_v4();
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadUpload(e.to_string()))?;
        if field.content_disposition().get_name() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("upload")
            .to_owned();
        let content_type = field.content_type().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| ApiError::BadUpload(e.to_string()))?;
            bytes.extend_from_slice(&data);
        }

        log::info!(
            "[{}] received {} ({}, {} bytes)",
            request_id,
            filename,
            content_type,
            bytes.len()
        );
        file_bytes = Some(bytes);
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::BadUpload("No file field in upload".to_owned()))?;

    // Decode and forward pass are CPU-bound, so they run off the executor.
    let state = state.clone();
    let started = Instant::now();
    let raw = web::block(move || {
        let tensor = preprocess::image_to_tensor(&bytes)?;
        state.classifier()?.predict(tensor)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    let response = PredictionResponse::from_score(raw, started.elapsed().as_secs_f64());
    log::info!(
        "[{}] {:?} raw={:.4} in {:.2}s",
        request_id,
        response.classification,
        response.raw_prediction,
        response.processing_time
    );
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /health` — always 200, reports whether the artifact loaded.
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::new(state.model_loaded()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn missing_model_state() -> web::Data<AppState> {
        let config = EnvConfig {
            model_path: "does-not-exist/classifier.onnx".to_owned(),
            host_address: "127.0.0.1".to_owned(),
            port: 0,
        };
        web::Data::new(AppState::initialize(&config))
    }

    fn multipart_body(field_name: &str, filename: &str, bytes: &[u8]) -> (String, Vec<u8>) {
        let boundary = "----histoclass-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                boundary, field_name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", boundary),
            body,
        )
    }

    #[actix_web::test]
    async fn health_reports_missing_model() {
        let app = test::init_service(
            App::new()
                .app_data(missing_model_state())
                .route("/health", web::get().to(health)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_loaded"], false);
    }

    #[actix_web::test]
    async fn predict_without_model_is_service_unavailable() {
        let app = test::init_service(
            App::new()
                .app_data(missing_model_state())
                .route("/predict/", web::post().to(predict)),
        )
        .await;

        let (content_type, body) = multipart_body("file", "slide.png", b"pixels");
        let req = test::TestRequest::post()
            .uri("/predict/")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Model not loaded");
    }

    #[actix_web::test]
    async fn zero_byte_upload_still_gets_a_detail_message() {
        let app = test::init_service(
            App::new()
                .app_data(missing_model_state())
                .route("/predict/", web::post().to(predict)),
        )
        .await;

        let (content_type, body) = multipart_body("file", "empty.png", b"");
        let req = test::TestRequest::post()
            .uri("/predict/")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error() || resp.status().is_server_error());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["detail"].is_string());
    }
}
