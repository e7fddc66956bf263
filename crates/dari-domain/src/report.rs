use serde::{Deserialize, Serialize};

/// Kind of an outbound subscriber report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    DeviceInfo,
    DeviceStatus,
    DisasterResult,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceInfo => "DEVICE_INFO",
            Self::DeviceStatus => "DEVICE_STATUS",
            Self::DisasterResult => "DISASTER_RESULT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DEVICE_INFO" => Some(Self::DeviceInfo),
            "DEVICE_STATUS" => Some(Self::DeviceStatus),
            "DISASTER_RESULT" => Some(Self::DisasterResult),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
