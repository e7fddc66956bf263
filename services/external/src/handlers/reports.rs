use axum::Json;
use axum::extract::State;
use serde::Deserialize;

use crate::domain::types::{DeviceStatusEntry, DeviceUpsert, ReportWrites};
use crate::error::{ExternalError, FieldError};
use crate::state::AppState;
use crate::usecase::report_ingress::ReportIngressUseCase;

use super::auth::SystemAuth;

// ── POST /api/reports/device-info ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfoRequest {
    #[serde(default)]
    pub devices: Vec<DeviceInfoEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfoEntry {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server_ip: Option<String>,
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn submit_device_info(
    State(state): State<AppState>,
    auth: SystemAuth,
    body: String,
) -> Result<Json<serde_json::Value>, ExternalError> {
    let request: DeviceInfoRequest = parse_body(&body)?;
    let devices = validate_device_info(&request)?;

    let usecase = ReportIngressUseCase {
        repo: state.ingress(),
        transmits: state.transmits(),
    };
    usecase
        .submit_device_info(
            &auth.0,
            "/api/reports/device-info",
            &body,
            ReportWrites::Devices(devices),
        )
        .await?;
    Ok(Json(serde_json::json!({ "message": "device info accepted" })))
}

fn validate_device_info(request: &DeviceInfoRequest) -> Result<Vec<DeviceUpsert>, ExternalError> {
    let mut errors = Vec::new();
    if request.devices.is_empty() {
        errors.push(FieldError::new("devices", "must not be empty"));
    }
    for (i, entry) in request.devices.iter().enumerate() {
        if blank(&entry.device_id) {
            errors.push(FieldError::new(format!("devices[{i}].deviceId"), "required"));
        }
        if blank(&entry.kind) {
            errors.push(FieldError::new(format!("devices[{i}].type"), "required"));
        }
        if blank(&entry.name) {
            errors.push(FieldError::new(format!("devices[{i}].name"), "required"));
        }
    }
    if !errors.is_empty() {
        return Err(ExternalError::Validation(errors));
    }

    Ok(request
        .devices
        .iter()
        .map(|entry| DeviceUpsert {
            device_id: entry.device_id.clone().unwrap_or_default(),
            kind: entry.kind.clone().unwrap_or_default(),
            name: entry.name.clone().unwrap_or_default(),
            server_ip: entry.server_ip.clone(),
            server_name: entry.server_name.clone(),
            model: entry.model.clone(),
            lat: entry.lat,
            lon: entry.lon,
            address: entry.address.clone(),
            note: entry.note.clone(),
        })
        .collect())
}

// ── POST /api/reports/device-status ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusRequest {
    #[serde(default)]
    pub statuses: Vec<DeviceStatusReqEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusReqEntry {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn submit_device_status(
    State(state): State<AppState>,
    auth: SystemAuth,
    body: String,
) -> Result<Json<serde_json::Value>, ExternalError> {
    let request: DeviceStatusRequest = parse_body(&body)?;
    let statuses = validate_device_status(&request)?;

    let usecase = ReportIngressUseCase {
        repo: state.ingress(),
        transmits: state.transmits(),
    };
    usecase
        .submit_device_status(
            &auth.0,
            "/api/reports/device-status",
            &body,
            ReportWrites::DeviceStatuses(statuses),
        )
        .await?;
    Ok(Json(serde_json::json!({ "message": "device status accepted" })))
}

fn validate_device_status(
    request: &DeviceStatusRequest,
) -> Result<Vec<DeviceStatusEntry>, ExternalError> {
    let mut errors = Vec::new();
    if request.statuses.is_empty() {
        errors.push(FieldError::new("statuses", "must not be empty"));
    }
    for (i, entry) in request.statuses.iter().enumerate() {
        if blank(&entry.device_id) {
            errors.push(FieldError::new(format!("statuses[{i}].deviceId"), "required"));
        }
        if blank(&entry.status) {
            errors.push(FieldError::new(format!("statuses[{i}].status"), "required"));
        }
    }
    if !errors.is_empty() {
        return Err(ExternalError::Validation(errors));
    }

    Ok(request
        .statuses
        .iter()
        .map(|entry| DeviceStatusEntry {
            device_id: entry.device_id.clone().unwrap_or_default(),
            status: entry.status.clone().unwrap_or_default(),
            note: entry.note.clone(),
        })
        .collect())
}

// ── POST /api/reports/disaster-result ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterResultRequest {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub result_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn submit_disaster_result(
    State(state): State<AppState>,
    auth: SystemAuth,
    body: String,
) -> Result<Json<serde_json::Value>, ExternalError> {
    let request: DisasterResultRequest = parse_body(&body)?;
    let identifier = match &request.identifier {
        Some(identifier) if !identifier.trim().is_empty() => identifier.clone(),
        _ => {
            return Err(ExternalError::Validation(vec![FieldError::new(
                "identifier",
                "required",
            )]));
        }
    };

    let usecase = ReportIngressUseCase {
        repo: state.ingress(),
        transmits: state.transmits(),
    };
    usecase
        .submit_disaster_result(&auth.0, "/api/reports/disaster-result", &body, &identifier)
        .await?;
    Ok(Json(serde_json::json!({ "message": "disaster result accepted" })))
}

// ── shared ───────────────────────────────────────────────────────────────────

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ExternalError> {
    serde_json::from_str(body).map_err(|err| ExternalError::Parsing(err.to_string()))
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
