//! Structured messages sent to YellowAnt: text, data, attachments, an error
//! object and log entries.
//!
//! Setters that take arbitrary values validate them up front and leave the
//! previous value in place when validation fails.

use super::{ErrorKind, Result};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Message {
    message_text: String,
    data: Value,
    attachments: Vec<Attachment>,
    #[serde(serialize_with = "serialize_error")]
    error: Option<MessageError>,
    logs: Vec<LogEntry>,
}

impl Default for Message {
    fn default() -> Message {
        Message::new("")
    }
}

impl Message {
    pub fn new<S: Into<String>>(text: S) -> Message {
        Message {
            message_text: text.into(),
            data: Value::Object(Map::new()),
            attachments: vec![],
            error: None,
            logs: vec![],
        }
    }

    pub fn text(&self) -> &str {
        &self.message_text
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.message_text = text.into();
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Replaces the data payload. Fails if `data` has no JSON representation.
    pub fn set_data<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
        self.data = to_json_value("data", data)?;
        Ok(())
    }

    pub fn error(&self) -> Option<&MessageError> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: MessageError) {
        self.error = Some(error);
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn add_log(&mut self, log: LogEntry) {
        self.logs.push(log);
    }

    /// The full message as `{attachments, data, error, logs, message_text}`.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self, format: &JsonFormat) -> Result<String> {
        format.to_string(self)
    }
}

fn serialize_error<S>(
    error: &Option<MessageError>,
    serializer: S,
) -> ::std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match *error {
        Some(ref error) => error.serialize(serializer),
        None => Map::new().serialize(serializer),
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Attachment {
    pub image_url: String,
    pub thumb_url: String,
    pub color: String,
    pub text: String,
    pub author_name: String,
    pub author_icon: String,
    pub author_link: String,
    pub footer: String,
    pub footer_icon: String,
    pub pretext: String,
    pub title: String,
    pub title_link: String,
    status: i64,
    ts: i64,
    fields: Vec<Field>,
    buttons: Vec<Button>,
}

impl Attachment {
    pub fn new() -> Attachment {
        Attachment::default()
    }

    pub fn status(&self) -> i64 {
        self.status
    }

    /// Sets the status. Anything other than a JSON integer is rejected.
    pub fn set_status<T: Serialize + ?Sized>(&mut self, status: &T) -> Result<()> {
        self.status = integer("status", status)?;
        Ok(())
    }

    pub fn ts(&self) -> i64 {
        self.ts
    }

    /// Sets the Unix timestamp. Anything other than a JSON integer is rejected.
    pub fn set_ts<T: Serialize + ?Sized>(&mut self, ts: &T) -> Result<()> {
        self.ts = integer("ts", ts)?;
        Ok(())
    }

    pub fn set_timestamp(&mut self, time: DateTime<Utc>) {
        self.ts = time.timestamp();
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn attach_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn attach_button(&mut self, button: Button) {
        self.buttons.push(button);
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Field {
    pub title: String,
    /// Rendered side by side with neighbouring short fields. Sent as 0/1.
    #[serde(serialize_with = "serialize_flag")]
    pub short: bool,
    pub value: String,
}

impl Field {
    pub fn new<T: Into<String>, V: Into<String>>(title: T, value: V) -> Field {
        Field {
            title: title.into(),
            short: true,
            value: value.into(),
        }
    }
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(if *flag { 1 } else { 0 })
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Button {
    pub value: String,
    pub name: String,
    pub text: String,
    command: Value,
}

impl Default for Button {
    fn default() -> Button {
        Button {
            value: "value".to_owned(),
            name: "name".to_owned(),
            text: String::new(),
            command: Value::Object(Map::new()),
        }
    }
}

impl Button {
    pub fn new<S: Into<String>>(text: S) -> Button {
        Button {
            text: text.into(),
            ..Button::default()
        }
    }

    pub fn command(&self) -> &Value {
        &self.command
    }

    /// The command YellowAnt invokes when the button is pressed.
    pub fn set_command<T: Serialize + ?Sized>(&mut self, command: &T) -> Result<()> {
        self.command = to_json_value("command", command)?;
        Ok(())
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct MessageError {
    pub code: String,
    pub name: String,
    pub text: String,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct LogEntry {
    pub tag: String,
    pub name: String,
    pub text: String,
}

impl LogEntry {
    pub fn new<T: Into<String>, N: Into<String>, X: Into<String>>(tag: T, name: N, text: X) -> LogEntry {
        LogEntry {
            tag: tag.into(),
            name: name.into(),
            text: text.into(),
        }
    }
}

fn to_json_value<T: Serialize + ?Sized>(field: &'static str, value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ErrorKind::InvalidValue(field, format!("must be JSON serializable: {}", e)).into())
}

fn integer<T: Serialize + ?Sized>(field: &'static str, value: &T) -> Result<i64> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ErrorKind::InvalidValue(field, "must be an integer".to_owned()).into())
}

/// Output options for JSON text.
#[derive(Clone, Debug, PartialEq)]
pub struct JsonFormat {
    pub sort_keys: bool,
    /// Spaces per level; `None` for compact output.
    pub indent: Option<usize>,
}

impl Default for JsonFormat {
    fn default() -> JsonFormat {
        JsonFormat {
            sort_keys: true,
            indent: Some(4),
        }
    }
}

impl JsonFormat {
    pub fn compact() -> JsonFormat {
        JsonFormat {
            sort_keys: true,
            indent: None,
        }
    }

    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let mut out = Vec::new();
        if self.sort_keys {
            let sorted = sort_keys(serde_json::to_value(value)?);
            self.write(&mut out, &sorted)?;
        } else {
            self.write(&mut out, value)?;
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn write<W: ::std::io::Write, T: Serialize + ?Sized>(&self, writer: W, value: &T) -> Result<()> {
        match self.indent {
            Some(width) => {
                let indent = vec![b' '; width];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
                let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
                value.serialize(&mut ser)?;
            }
            None => serde_json::to_writer(writer, value)?,
        }
        Ok(())
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
