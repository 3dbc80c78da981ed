//! Command-line client for the classification service.
//!
//! Uploads one image and prints the prediction. Transport failures are
//! retried with exponential backoff under an outer deadline, so a server
//! that is still loading its model does not lose the upload.

use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::{Duration, Instant};

use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "histoclass-client",
    about = "Submit a histopathology image for benign/malignant classification"
)]
struct Opt {
    /// Image file to classify (PNG, JPEG or TIFF)
    #[structopt(parse(from_os_str))]
    image: PathBuf,

    /// Prediction endpoint
    #[structopt(long, default_value = "http://localhost:8000/predict/")]
    endpoint: String,

    /// Per-request timeout in seconds
    #[structopt(long, default_value = "30")]
    timeout: u64,

    /// Give up on transport failures after this many seconds
    #[structopt(long, default_value = "120")]
    deadline: u64,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    classification: String,
    confidence: f64,
    raw_prediction: f64,
    processing_time: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

fn main() {
    let opt = Opt::from_args();

    let bytes = match std::fs::read(&opt.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Cannot read {}: {}", opt.image.display(), e);
            exit(1);
        }
    };
    let filename = opt
        .image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_owned());
    let content_type = content_type_for(&opt.image);

    let client = match Client::builder()
        .timeout(Duration::from_secs(opt.timeout))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Cannot build HTTP client: {}", e);
            exit(1);
        }
    };

    let deadline = Instant::now() + Duration::from_secs(opt.deadline);
    let mut delay = Duration::from_millis(500);
    let mut attempt = 0u32;

    let response = loop {
        attempt += 1;
        // The byte buffer outlives every attempt, so a retry never loses
        // the user's upload.
        let part = match multipart::Part::bytes(bytes.clone())
            .file_name(filename.clone())
            .mime_str(content_type)
        {
            Ok(part) => part,
            Err(e) => {
                eprintln!("Cannot build upload: {}", e);
                exit(1);
            }
        };
        let form = multipart::Form::new().part("file", part);

        match client.post(&opt.endpoint).multipart(form).send() {
            Ok(response) => break response,
            Err(e) if e.is_timeout() => {
                eprintln!("Attempt {}: request timed out", attempt);
            }
            Err(e) if e.is_connect() => {
                eprintln!(
                    "Attempt {}: cannot connect to {} (server may still be starting)",
                    attempt, opt.endpoint
                );
            }
            Err(e) => {
                eprintln!("Request failed: {}", e);
                exit(1);
            }
        }

        if Instant::now() + delay > deadline {
            eprintln!("Giving up after {} attempts", attempt);
            exit(1);
        }
        std::thread::sleep(delay);
        delay = (delay * 2).min(Duration::from_secs(10));
    };

    let status = response.status();
    if status.is_success() {
        match response.json::<Prediction>() {
            Ok(p) => {
                println!("Classification:  {}", p.classification);
                println!("Confidence:      {:.2}%", p.confidence);
                println!("Raw prediction:  {:.4}", p.raw_prediction);
                println!("Processing time: {:.2}s", p.processing_time);
            }
            Err(e) => {
                eprintln!("Malformed response body: {}", e);
                exit(1);
            }
        }
    } else {
        let detail = response
            .json::<ErrorBody>()
            .map(|b| b.detail)
            .unwrap_or_else(|_| format!("HTTP {}", status));
        eprintln!("Server error ({}): {}", status, detail);
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_the_accepted_formats() {
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.tif")), "image/tiff");
        assert_eq!(content_type_for(Path::new("a.tiff")), "image/tiff");
        assert_eq!(
            content_type_for(Path::new("mystery")),
            "application/octet-stream"
        );
    }
}
