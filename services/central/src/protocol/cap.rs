use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use dari_domain::report::ReportKind;

use super::envelope::{XmlError, element_name, write_cdata_el, write_opt_text, write_text_el};

pub const CAP_XMLNS: &str = "urn:oasis:names:tc:emergency:cap:1.2";

/// Profile code every message on this link carries.
pub const PROFILE_CODE: &str = "대한민국정부1.2";

/// CAP 1.2 `<alert>` as used on this link. Optional everywhere — validation
/// is the intake pipeline's job, not the parser's.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapAlert {
    pub identifier: Option<String>,
    pub sender: Option<String>,
    pub sent: Option<String>,
    pub status: Option<String>,
    pub msg_type: Option<String>,
    pub scope: Option<String>,
    pub addresses: Option<String>,
    pub code: Vec<String>,
    pub note: Option<String>,
    pub references: Option<String>,
    pub info: Option<CapInfo>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapInfo {
    pub language: Option<String>,
    pub category: Option<String>,
    pub event: Option<String>,
    pub urgency: Option<String>,
    pub severity: Option<String>,
    pub certainty: Option<String>,
    pub event_code: Option<CapNamedValue>,
    pub parameters: Vec<CapNamedValue>,
}

/// `valueName`/`value` pair used by `<eventCode>` and `<parameter>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapNamedValue {
    pub value_name: String,
    pub value: String,
}

impl CapAlert {
    /// The event code carried under `info/eventCode/value`, if any.
    pub fn event_code(&self) -> Option<&str> {
        self.info
            .as_ref()
            .and_then(|info| info.event_code.as_ref())
            .map(|code| code.value.as_str())
    }
}

/// Consume events up to and including `</alert>`. The opening `<alert>` has
/// already been read by the caller.
pub(crate) fn read_alert(reader: &mut Reader<&[u8]>) -> Result<CapAlert, XmlError> {
    let mut alert = CapAlert::default();
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match element_name(e.name().as_ref()).as_str() {
                "info" => alert.info = Some(read_info(reader)?),
                name => {
                    field = Some(name.to_owned());
                    text.clear();
                }
            },
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                let name = element_name(e.name().as_ref());
                if name == "alert" {
                    return Ok(alert);
                }
                if let Some(current) = field.take() {
                    if current == name {
                        assign_alert(&mut alert, &current, text.trim());
                    }
                }
            }
            Event::Empty(_) => field = None,
            Event::Eof => {
                return Err(XmlError::Structure("unterminated <alert>".to_owned()));
            }
            _ => {}
        }
    }
}

fn assign_alert(alert: &mut CapAlert, field: &str, value: &str) {
    match field {
        "identifier" => alert.identifier = Some(value.to_owned()),
        "sender" => alert.sender = Some(value.to_owned()),
        "sent" => alert.sent = Some(value.to_owned()),
        "status" => alert.status = Some(value.to_owned()),
        "msgType" => alert.msg_type = Some(value.to_owned()),
        "scope" => alert.scope = Some(value.to_owned()),
        "addresses" => alert.addresses = Some(value.to_owned()),
        "code" => alert.code.push(value.to_owned()),
        "note" => alert.note = Some(value.to_owned()),
        "references" => alert.references = Some(value.to_owned()),
        _ => {}
    }
}

fn read_info(reader: &mut Reader<&[u8]>) -> Result<CapInfo, XmlError> {
    let mut info = CapInfo::default();
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match element_name(e.name().as_ref()).as_str() {
                "eventCode" => info.event_code = Some(read_named_value(reader, "eventCode")?),
                "parameter" => info.parameters.push(read_named_value(reader, "parameter")?),
                name => {
                    field = Some(name.to_owned());
                    text.clear();
                }
            },
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                let name = element_name(e.name().as_ref());
                if name == "info" {
                    return Ok(info);
                }
                if let Some(current) = field.take() {
                    if current == name {
                        assign_info(&mut info, &current, text.trim());
                    }
                }
            }
            Event::Empty(_) => field = None,
            Event::Eof => {
                return Err(XmlError::Structure("unterminated <info>".to_owned()));
            }
            _ => {}
        }
    }
}

fn assign_info(info: &mut CapInfo, field: &str, value: &str) {
    match field {
        "language" => info.language = Some(value.to_owned()),
        "category" => info.category = Some(value.to_owned()),
        "event" => info.event = Some(value.to_owned()),
        "urgency" => info.urgency = Some(value.to_owned()),
        "severity" => info.severity = Some(value.to_owned()),
        "certainty" => info.certainty = Some(value.to_owned()),
        _ => {}
    }
}

fn read_named_value(
    reader: &mut Reader<&[u8]>,
    container: &'static str,
) -> Result<CapNamedValue, XmlError> {
    let mut pair = CapNamedValue::default();
    let mut field: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                field = Some(element_name(e.name().as_ref()));
                text.clear();
            }
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                let name = element_name(e.name().as_ref());
                if name == container {
                    return Ok(pair);
                }
                if let Some(current) = field.take() {
                    if current == name {
                        match current.as_str() {
                            "valueName" => pair.value_name = text.trim().to_owned(),
                            "value" => pair.value = text.trim().to_owned(),
                            _ => {}
                        }
                    }
                }
            }
            Event::Empty(_) => field = None,
            Event::Eof => {
                return Err(XmlError::Structure(format!("unterminated <{container}>")));
            }
            _ => {}
        }
    }
}

pub(crate) fn write_alert<W: std::io::Write>(
    writer: &mut Writer<W>,
    alert: &CapAlert,
) -> Result<(), XmlError> {
    let mut start = BytesStart::new("alert");
    start.push_attribute(("xmlns", CAP_XMLNS));
    writer.write_event(Event::Start(start))?;

    write_opt_text(writer, "identifier", alert.identifier.as_deref())?;
    write_opt_text(writer, "sender", alert.sender.as_deref())?;
    write_opt_text(writer, "sent", alert.sent.as_deref())?;
    write_opt_text(writer, "status", alert.status.as_deref())?;
    write_opt_text(writer, "msgType", alert.msg_type.as_deref())?;
    write_opt_text(writer, "scope", alert.scope.as_deref())?;
    write_opt_text(writer, "addresses", alert.addresses.as_deref())?;
    for code in &alert.code {
        write_text_el(writer, "code", code)?;
    }
    if let Some(note) = &alert.note {
        write_cdata_el(writer, "note", note)?;
    }
    write_opt_text(writer, "references", alert.references.as_deref())?;
    if let Some(info) = &alert.info {
        write_info(writer, info)?;
    }

    writer.write_event(Event::End(BytesEnd::new("alert")))?;
    Ok(())
}

fn write_info<W: std::io::Write>(writer: &mut Writer<W>, info: &CapInfo) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new("info")))?;
    write_opt_text(writer, "language", info.language.as_deref())?;
    write_opt_text(writer, "category", info.category.as_deref())?;
    if let Some(event) = &info.event {
        write_cdata_el(writer, "event", event)?;
    }
    write_opt_text(writer, "urgency", info.urgency.as_deref())?;
    write_opt_text(writer, "severity", info.severity.as_deref())?;
    write_opt_text(writer, "certainty", info.certainty.as_deref())?;
    if let Some(code) = &info.event_code {
        write_named_value(writer, "eventCode", code, false)?;
    }
    for parameter in &info.parameters {
        write_named_value(writer, "parameter", parameter, true)?;
    }
    writer.write_event(Event::End(BytesEnd::new("info")))?;
    Ok(())
}

fn write_named_value<W: std::io::Write>(
    writer: &mut Writer<W>,
    container: &str,
    pair: &CapNamedValue,
    cdata_value: bool,
) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(container)))?;
    write_text_el(writer, "valueName", &pair.value_name)?;
    if cdata_value {
        write_cdata_el(writer, "value", &pair.value)?;
    } else {
        write_text_el(writer, "value", &pair.value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(container)))?;
    Ok(())
}

/// CAP reference string: `sender,identifier,sent`.
pub fn reference_string(sender: &str, identifier: &str, sent: &str) -> String {
    format!("{sender},{identifier},{sent}")
}

/// Build the ack/nack alert for a disaster notification.
///
/// References the original `(sender, identifier, sent)` when the original
/// alert was parseable, takes `<identifier>_ACK` as its own identifier and
/// carries `note = "<code>|<message>"`.
pub fn build_ack_alert(
    original: Option<&CapAlert>,
    dest_id: &str,
    sent: &str,
    note_code: &str,
    note_message: &str,
) -> CapAlert {
    let identifier = original
        .and_then(|alert| alert.identifier.as_deref())
        .map(|id| format!("{id}_ACK"));
    let references = original.and_then(|alert| {
        match (&alert.sender, &alert.identifier, &alert.sent) {
            (Some(sender), Some(identifier), Some(original_sent)) => {
                Some(reference_string(sender, identifier, original_sent))
            }
            _ => None,
        }
    });

    CapAlert {
        identifier,
        sender: Some(dest_id.to_owned()),
        sent: Some(sent.to_owned()),
        status: Some("Actual".to_owned()),
        msg_type: Some("Ack".to_owned()),
        scope: Some("Private".to_owned()),
        code: vec![PROFILE_CODE.to_owned()],
        note: Some(format!("{note_code}|{note_message}")),
        references,
        ..Default::default()
    }
}

/// Shape of one outbound report CAP.
struct ReportProfile {
    msg_type: &'static str,
    event: &'static str,
    event_code: &'static str,
    parameter_name: &'static str,
}

fn report_profile(kind: ReportKind) -> ReportProfile {
    match kind {
        ReportKind::DeviceInfo => ReportProfile {
            msg_type: "Alert",
            event: "단말장치 제원정보",
            event_code: "DIS",
            parameter_name: "DEVICE_DATA",
        },
        ReportKind::DeviceStatus => ReportProfile {
            msg_type: "Alert",
            event: "단말장치 상태정보",
            event_code: "DIS",
            parameter_name: "DEVICE_STATUS",
        },
        ReportKind::DisasterResult => ReportProfile {
            msg_type: "Ack",
            event: "결과 보고",
            event_code: "DIM",
            parameter_name: "LASReport",
        },
    }
}

/// Build the CAP for an outbound subscriber report. The raw subscriber
/// payload rides in a single CDATA parameter value.
pub fn build_report_alert(
    kind: ReportKind,
    identifier: &str,
    central_id: &str,
    central_address: &str,
    sent: &str,
    payload: &str,
    references: Option<String>,
) -> CapAlert {
    let profile = report_profile(kind);
    CapAlert {
        identifier: Some(identifier.to_owned()),
        sender: Some(central_id.to_owned()),
        sent: Some(sent.to_owned()),
        status: Some("Actual".to_owned()),
        msg_type: Some(profile.msg_type.to_owned()),
        scope: Some("Private".to_owned()),
        addresses: Some(central_address.to_owned()),
        code: vec![PROFILE_CODE.to_owned()],
        references,
        info: Some(CapInfo {
            language: Some("ko-KR".to_owned()),
            category: Some("Safety".to_owned()),
            event: Some(profile.event.to_owned()),
            urgency: Some("Unknown".to_owned()),
            severity: Some("Unknown".to_owned()),
            certainty: Some("Unknown".to_owned()),
            event_code: Some(CapNamedValue {
                value_name: "EVENT_CODE".to_owned(),
                value: profile.event_code.to_owned(),
            }),
            parameters: vec![CapNamedValue {
                value_name: profile.parameter_name.to_owned(),
                value: payload.to_owned(),
            }],
        }),
        ..Default::default()
    }
}
