use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

use super::cap::{self, CapAlert};

/// Typed view of the `<data>` envelope wrapping every XML body on the link.
///
/// Requests, replies and notifications all share this shape; absent
/// elements stay `None`. The nested CAP alert (under `<capInfo>`) is the
/// only structured child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub dest_id: Option<String>,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    pub response: Option<String>,
    pub cmd: Option<String>,
    pub time: Option<String>,
    pub result_code: Option<String>,
    pub result: Option<String>,
    pub trans_msg_id: Option<String>,
    pub trans_msg_seq: Option<i32>,
    pub alert: Option<CapAlert>,
}

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml syntax: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("xml write: {0}")]
    Write(#[from] std::io::Error),
    #[error("unexpected document structure: {0}")]
    Structure(String),
    #[error("invalid number in <{0}>")]
    InvalidNumber(&'static str),
}

impl Envelope {
    /// Parse an envelope from a body string.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut envelope = Envelope::default();
        let mut seen_data = false;
        let mut in_cap_info = false;
        let mut field: Option<String> = None;
        let mut text = String::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => match element_name(e.name().as_ref()).as_str() {
                    "data" => seen_data = true,
                    "capInfo" => in_cap_info = true,
                    "alert" if in_cap_info => {
                        envelope.alert = Some(cap::read_alert(&mut reader)?);
                    }
                    name => {
                        field = Some(name.to_owned());
                        text.clear();
                    }
                },
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
                Event::End(e) => {
                    let name = element_name(e.name().as_ref());
                    if name == "capInfo" {
                        in_cap_info = false;
                    } else if let Some(current) = field.take() {
                        if current == name {
                            envelope.assign(&current, text.trim())?;
                        }
                    }
                }
                Event::Empty(_) => field = None,
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_data {
            return Err(XmlError::Structure("missing <data> root".to_owned()));
        }
        Ok(envelope)
    }

    fn assign(&mut self, field: &str, value: &str) -> Result<(), XmlError> {
        match field {
            "destId" => self.dest_id = Some(value.to_owned()),
            "realm" => self.realm = Some(value.to_owned()),
            "nonce" => self.nonce = Some(value.to_owned()),
            "response" => self.response = Some(value.to_owned()),
            "cmd" => self.cmd = Some(value.to_owned()),
            "time" => self.time = Some(value.to_owned()),
            "resultCode" => self.result_code = Some(value.to_owned()),
            "result" => self.result = Some(value.to_owned()),
            "transMsgId" => self.trans_msg_id = Some(value.to_owned()),
            "transMsgSeq" => {
                let seq = value
                    .parse::<i32>()
                    .map_err(|_| XmlError::InvalidNumber("transMsgSeq"))?;
                self.trans_msg_seq = Some(seq);
            }
            _ => {}
        }
        Ok(())
    }

    /// Serialize back to a `<data>` document. Free-text fields are wrapped
    /// in CDATA.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new("data")))?;

        write_opt_text(&mut writer, "destId", self.dest_id.as_deref())?;
        write_opt_text(&mut writer, "realm", self.realm.as_deref())?;
        write_opt_text(&mut writer, "nonce", self.nonce.as_deref())?;
        write_opt_text(&mut writer, "response", self.response.as_deref())?;
        write_opt_text(&mut writer, "cmd", self.cmd.as_deref())?;
        write_opt_text(&mut writer, "time", self.time.as_deref())?;
        write_opt_text(&mut writer, "resultCode", self.result_code.as_deref())?;
        if let Some(result) = &self.result {
            write_cdata_el(&mut writer, "result", result)?;
        }
        write_opt_text(&mut writer, "transMsgId", self.trans_msg_id.as_deref())?;
        if let Some(seq) = self.trans_msg_seq {
            write_text_el(&mut writer, "transMsgSeq", &seq.to_string())?;
        }
        if let Some(alert) = &self.alert {
            writer.write_event(Event::Start(BytesStart::new("capInfo")))?;
            cap::write_alert(&mut writer, alert)?;
            writer.write_event(Event::End(BytesEnd::new("capInfo")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("data")))?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

/// Strip any namespace prefix.
pub(crate) fn element_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_owned(),
        None => name.into_owned(),
    }
}

pub(crate) fn write_text_el<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn write_cdata_el<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), XmlError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::CData(BytesCData::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn write_opt_text<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: Option<&str>,
) -> Result<(), XmlError> {
    if let Some(value) = value {
        write_text_el(writer, name, value)?;
    }
    Ok(())
}
