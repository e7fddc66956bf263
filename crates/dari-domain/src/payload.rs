use serde::{Deserialize, Serialize};

use crate::report::ReportKind;

/// Bus payload for the `disaster.<eventCode>` stream (central → external).
///
/// `raw_message` carries the full `<data>` envelope exactly as received on
/// the upstream link, so the external side can forward it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterMessage {
    pub identifier: String,
    pub event_code: String,
    pub raw_message: String,
}

/// Bus payload for the `report.external` stream (external → central).
///
/// `raw_message` is the subscriber's HTTP request body, untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessage {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub external_system_name: String,
    pub raw_message: String,
}
