//! Blocking client for the dashboard's backend endpoints.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use ureq::{Agent, AgentBuilder, Response};

use crate::model::{Dataset, LatLng, RiskArea};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000/api";

const MULTIPART_BOUNDARY: &str = "----fire-risk-map-boundary-7d3f1c";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read body: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] simd_json::Error),
}

/// Anything that can produce a fresh dataset for the map
pub trait DataSource {
    fn fetch(&self) -> Result<Dataset, ApiError>;
}

/// Weather inputs for a risk prediction
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 50.0,
            wind_speed: 10.0,
            precipitation: 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PredictRequest {
    pub location: LatLng,
    pub weather: Weather,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Prediction {
    pub risk_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DetectionRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FireDetection {
    pub has_fire: bool,
    pub confidence: f64,
    #[serde(default)]
    pub regions: Vec<DetectionRegion>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DetectionReport {
    pub detections: FireDetection,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AllocationRequest<'a> {
    pub risk_areas: &'a [RiskArea],
    pub available_resources: &'a BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AreaAllocation {
    pub area_id: u64,
    pub area_name: String,
    pub risk_score: f64,
    #[serde(default)]
    pub recommended_resources: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AllocationPlan {
    #[serde(default)]
    pub recommendations: Vec<AreaAllocation>,
    #[serde(default)]
    pub timestamp: String,
}

/// HTTP client bound to one API base URL
#[derive(Clone)]
pub struct ApiClient {
    base: String,
    agent: Agent,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// `GET /sample-data`
    pub fn get_risk_data(&self) -> Result<Dataset, ApiError> {
        let url = self.url("sample-data");
        debug!(%url, "fetching risk data");
        let resp = check(&url, self.agent.get(&url).call())?;
        let mut data: Dataset = decode(resp)?;
        data.normalize();
        info!(
            areas = data.risk_areas.len(),
            fires = data.active_fires.len(),
            resources = data.resources.len(),
            "loaded risk data"
        );
        Ok(data)
    }

    /// `POST /predict`
    pub fn predict_risk(&self, location: LatLng, weather: Weather) -> Result<Prediction, ApiError> {
        let url = self.url("predict");
        let body = PredictRequest { location, weather };
        let resp = check(&url, self.agent.post(&url).send_json(&body))?;
        decode(resp)
    }

    /// `POST /detect` with the image as a multipart `image` field
    pub fn detect_fire(&self, image: &Path) -> Result<DetectionReport, ApiError> {
        let url = self.url("detect");
        let bytes = std::fs::read(image)?;
        let filename = image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        let body = multipart_body(filename, &bytes);
        let content_type = format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}");
        let resp = check(
            &url,
            self.agent
                .post(&url)
                .set("Content-Type", &content_type)
                .send_bytes(&body),
        )?;
        decode(resp)
    }

    /// `POST /resources`
    pub fn optimize_resources(
        &self,
        risk_areas: &[RiskArea],
        available: &BTreeMap<String, f64>,
    ) -> Result<AllocationPlan, ApiError> {
        let url = self.url("resources");
        let body = AllocationRequest {
            risk_areas,
            available_resources: available,
        };
        let resp = check(&url, self.agent.post(&url).send_json(&body))?;
        decode(resp)
    }
}

impl DataSource for ApiClient {
    fn fetch(&self) -> Result<Dataset, ApiError> {
        self.get_risk_data()
    }
}

fn check(url: &str, result: Result<Response, ureq::Error>) -> Result<Response, ApiError> {
    match result {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(status, _)) => Err(ApiError::Status {
            url: url.to_string(),
            status,
        }),
        Err(ureq::Error::Transport(t)) => Err(ApiError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        }),
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let mut buf = Vec::new();
    resp.into_reader().read_to_end(&mut buf)?;
    decode_bytes(&mut buf)
}

/// simd-json parses in place, so the buffer is consumed
pub fn decode_bytes<T: DeserializeOwned>(buf: &mut [u8]) -> Result<T, ApiError> {
    Ok(simd_json::serde::from_slice(buf)?)
}

/// Percent-encode quote, CR and LF so the filename stays inside its header
fn header_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    for ch in filename.chars() {
        match ch {
            '"' => out.push_str("%22"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            _ => out.push(ch),
        }
    }
    out
}

fn multipart_body(filename: &str, bytes: &[u8]) -> Vec<u8> {
    let filename = header_filename(filename);
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:5000/api/");
        assert_eq!(client.base(), "http://localhost:5000/api");
        assert_eq!(client.url("/sample-data"), "http://localhost:5000/api/sample-data");
    }

    #[test]
    fn test_predict_body_shape() {
        let body = PredictRequest {
            location: LatLng::new(37.0, -120.0),
            weather: Weather::default(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["location"]["lng"], -120.0);
        assert_eq!(json["weather"]["windSpeed"], 10.0);
        assert_eq!(json["weather"]["humidity"], 50.0);
    }

    #[test]
    fn test_allocation_body_shape() {
        let data = Dataset::sample();
        let mut available = BTreeMap::new();
        available.insert("firefighters".to_string(), 100.0);
        let body = AllocationRequest {
            risk_areas: &data.risk_areas,
            available_resources: &available,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["risk_areas"].as_array().unwrap().len(), 3);
        assert_eq!(json["available_resources"]["firefighters"], 100.0);
    }

    #[test]
    fn test_decode_dataset_with_simd_json() {
        let mut raw = br#"{"risk_areas":[],"active_fires":[{"id":5,"name":"Ridge Fire","location":{"lat":1.0,"lng":2.0},"intensity":0.4,"started":"2025-06-01"}]}"#.to_vec();
        let data: Dataset = decode_bytes(&mut raw).unwrap();
        assert_eq!(data.active_fires[0].name, "Ridge Fire");
        assert!(data.resources.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut raw = b"<html>bad gateway</html>".to_vec();
        let result: Result<Dataset, _> = decode_bytes(&mut raw);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_decode_detection_report() {
        let mut raw = br#"{"detections":{"has_fire":true,"confidence":0.7,"regions":[{"x":3,"y":4,"width":20,"height":20,"confidence":0.9}]},"timestamp":"t"}"#.to_vec();
        let report: DetectionReport = decode_bytes(&mut raw).unwrap();
        assert!(report.detections.has_fire);
        assert_eq!(report.detections.regions.len(), 1);
    }

    #[test]
    fn test_multipart_body_wraps_payload() {
        let body = multipart_body("sat.png", b"PNGDATA");
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with(&format!("--{MULTIPART_BOUNDARY}\r\n")));
        assert!(text.contains("name=\"image\"; filename=\"sat.png\""));
        assert!(text.contains("\r\n\r\nPNGDATA\r\n"));
        assert!(text.ends_with(&format!("--{MULTIPART_BOUNDARY}--\r\n")));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Port 9 on localhost is almost never listening
        let client = ApiClient::new("http://127.0.0.1:9/api");
        match client.get_risk_data() {
            Err(ApiError::Transport { url, .. }) => assert!(url.ends_with("/sample-data")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_multipart_filename_cannot_break_header() {
        let body = multipart_body("a\"b\r\nX-Evil: 1.png", b"DATA");
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("filename=\"a%22b%0D%0AX-Evil: 1.png\"\r\n"));
        // Boundary line, disposition, content type, blank line, payload, closing boundary
        assert_eq!(text.matches("\r\n").count(), 6);
    }
}
