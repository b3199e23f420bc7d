//! SOAP response decoding
//!
//! Converts an RPC/encoded SOAP response into plain JSON using quick-xml's
//! pull parser:
//! - namespace prefixes are dropped from element names
//! - `xsi:nil="true"` becomes `null`
//! - SOAP-encoded arrays become JSON arrays, whatever their item element is called
//! - repeated sibling elements become arrays
//! - leaf text is typed from its `xsi:type`

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Type hints carried by an element's attributes
#[derive(Debug, Default)]
struct Hints {
    nil: bool,
    array: bool,
    xsi_type: Option<String>,
}

/// An element being built
#[derive(Debug)]
struct Frame {
    name: String,
    hints: Hints,
    children: Vec<(String, JsonValue)>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut hints = Hints::default();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::xml(format!("Bad attribute on <{name}>: {e}")))?;
            let key = attr.key.local_name();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::xml(format!("Bad attribute value on <{name}>: {e}")))?;

            match key.as_ref() {
                b"nil" => hints.nil = matches!(&*value, "true" | "1"),
                b"arrayType" => hints.array = true,
                b"type" => {
                    let local = value.rsplit(':').next().unwrap_or_default().to_string();
                    if local.ends_with("Array") {
                        hints.array = true;
                    }
                    hints.xsi_type = Some(local);
                }
                _ => {}
            }
        }

        Ok(Self {
            name,
            hints,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn finish(self) -> (String, JsonValue) {
        let value = if self.hints.nil {
            JsonValue::Null
        } else if self.hints.array {
            JsonValue::Array(self.children.into_iter().map(|(_, v)| v).collect())
        } else if !self.children.is_empty() {
            JsonValue::Object(group_children(self.children))
        } else {
            typed_text(&self.text, self.hints.xsi_type.as_deref())
        };
        (self.name, value)
    }
}

/// Fold children into an object, turning repeated names into arrays
fn group_children(children: Vec<(String, JsonValue)>) -> JsonObject {
    let mut grouped: Vec<(String, Vec<JsonValue>)> = Vec::new();
    for (name, value) in children {
        match grouped.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => grouped.push((name, vec![value])),
        }
    }

    grouped
        .into_iter()
        .map(|(name, mut values)| {
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                JsonValue::Array(values)
            };
            (name, value)
        })
        .collect()
}

/// Type leaf text from its `xsi:type`
fn typed_text(text: &str, xsi_type: Option<&str>) -> JsonValue {
    match xsi_type {
        Some("int" | "integer" | "long" | "short" | "byte" | "unsignedInt" | "unsignedLong"
        | "unsignedShort" | "nonNegativeInteger") => text
            .parse::<i64>()
            .map_or_else(|_| string_or_null(text), JsonValue::from),
        Some("float" | "double" | "decimal") => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| string_or_null(text), JsonValue::Number),
        Some("boolean") => match text {
            "true" | "1" => JsonValue::Bool(true),
            "false" | "0" => JsonValue::Bool(false),
            _ => string_or_null(text),
        },
        Some("string") => JsonValue::String(text.to_string()),
        _ => string_or_null(text),
    }
}

fn string_or_null(text: &str) -> JsonValue {
    if text.is_empty() {
        JsonValue::Null
    } else {
        JsonValue::String(text.to_string())
    }
}

/// Convert an XML document into JSON
///
/// The result is an object holding the root element under its local name.
pub fn xml_to_json(xml: &str) -> Result<JsonValue> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, JsonValue)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::xml(format!(
                "Malformed XML at position {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.finish();
                attach(&mut stack, &mut root, name, value);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::xml("Unbalanced closing tag"))?;
                let (name, value) = frame.finish();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::xml(format!("Bad text content: {e}")))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::xml("Unexpected end of document"));
    }

    let (name, value) = root.ok_or_else(|| Error::xml("Document has no root element"))?;
    let mut obj = JsonObject::new();
    obj.insert(name, value);
    Ok(JsonValue::Object(obj))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<(String, JsonValue)>,
    name: String,
    value: JsonValue,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None => *root = Some((name, value)),
    }
}

/// Extract the return value of an RPC response envelope
///
/// A `Fault` in the body becomes [`Error::SoapFault`]. The response element's
/// single part is returned as-is; an empty response yields `null`.
pub fn parse_envelope(xml: &str) -> Result<JsonValue> {
    let doc = xml_to_json(xml)?;

    let body = doc
        .get("Envelope")
        .and_then(|env| env.get("Body"))
        .ok_or_else(|| Error::xml("Response is not a SOAP envelope"))?;

    if let Some(fault) = body.get("Fault") {
        let field = |name: &str| {
            fault
                .get(name)
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string()
        };
        return Err(Error::soap_fault(field("faultcode"), field("faultstring")));
    }

    let response = match body {
        JsonValue::Object(obj) => obj.values().next().cloned().unwrap_or(JsonValue::Null),
        _ => JsonValue::Null,
    };

    Ok(match response {
        JsonValue::Object(parts) if parts.len() == 1 => {
            parts.into_iter().next().map(|(_, v)| v).unwrap_or_default()
        }
        other => other,
    })
}

/// Fault carried by an error response body, if there is one
pub fn fault_from_body(xml: &str) -> Option<Error> {
    match parse_envelope(xml) {
        Err(fault @ Error::SoapFault { .. }) => Some(fault),
        _ => None,
    }
}
