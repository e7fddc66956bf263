/// `data_format` header value for XML bodies. The only format in use.
pub const DATA_FORMAT_XML: u32 = 1;

/// Operation codes carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageId {
    /// Session connect request (plain, then with digest response).
    ReqSysCon = 0x0001_0001,
    /// Connect reply: 401 challenge or final auth result.
    ResSysCon = 0x0001_0002,
    /// Periodic alive ping.
    ReqSysSts = 0x0001_0003,
    /// Alive pong.
    ResSysSts = 0x0001_0004,
    /// Disaster alert notification.
    NfyDisInfo = 0x0002_0001,
    /// Ack/nack for a disaster alert notification.
    CnfDisInfo = 0x0002_0002,
    /// Disaster result report.
    ReqDisReport = 0x0002_0003,
    /// Ack for a disaster result report.
    ResDisReport = 0x0002_0004,
    /// Device inventory report.
    NfyDeviceInfo = 0x0003_0001,
    /// Ack for a device inventory report.
    CnfDeviceInfo = 0x0003_0002,
    /// Device status report.
    NfyDeviceSts = 0x0003_0003,
    /// Ack for a device status report.
    CnfDeviceSts = 0x0003_0004,
}

impl MessageId {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x0001_0001 => Some(Self::ReqSysCon),
            0x0001_0002 => Some(Self::ResSysCon),
            0x0001_0003 => Some(Self::ReqSysSts),
            0x0001_0004 => Some(Self::ResSysSts),
            0x0002_0001 => Some(Self::NfyDisInfo),
            0x0002_0002 => Some(Self::CnfDisInfo),
            0x0002_0003 => Some(Self::ReqDisReport),
            0x0002_0004 => Some(Self::ResDisReport),
            0x0003_0001 => Some(Self::NfyDeviceInfo),
            0x0003_0002 => Some(Self::CnfDeviceInfo),
            0x0003_0003 => Some(Self::NfyDeviceSts),
            0x0003_0004 => Some(Self::CnfDeviceSts),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Acks the session driver routes to the report-transmit engine.
    pub fn is_report_ack(self) -> bool {
        matches!(
            self,
            Self::CnfDeviceInfo | Self::CnfDeviceSts | Self::ResDisReport
        )
    }
}
