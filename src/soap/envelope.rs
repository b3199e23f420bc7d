//! SOAP request envelopes
//!
//! The merchant service speaks RPC/encoded SOAP 1.1, so every parameter is
//! written with an explicit `xsi:type`.

use crate::types::format_date;
use chrono::NaiveDate;
use quick_xml::escape::escape;
use std::fmt::{self, Write};

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_ENC_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A typed SOAP parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum SoapValue {
    /// `xsd:int`
    Int(i64),
    /// `xsd:string`
    Str(String),
    /// `xsd:boolean`
    Bool(bool),
    /// `xsd:date`
    Date(NaiveDate),
    /// `xsi:nil="true"`
    Nil,
    /// A complex type from the service namespace
    Struct {
        /// Type name inside the service namespace (e.g. `ReportCampaignFilter`)
        type_name: String,
        /// Member fields in declaration order
        fields: Vec<(String, SoapValue)>,
    },
}

impl SoapValue {
    /// String value, or nil when absent
    pub fn opt_str(value: Option<&str>) -> Self {
        value.map_or(SoapValue::Nil, |s| SoapValue::Str(s.to_string()))
    }

    /// Empty complex value
    pub fn empty_struct(type_name: impl Into<String>) -> Self {
        SoapValue::Struct {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    fn write_to(&self, name: &str, out: &mut String) -> fmt::Result {
        match self {
            SoapValue::Int(v) => write!(out, r#"<{name} xsi:type="xsd:int">{v}</{name}>"#),
            SoapValue::Str(v) => write!(
                out,
                r#"<{name} xsi:type="xsd:string">{}</{name}>"#,
                escape(v.as_str())
            ),
            SoapValue::Bool(v) => write!(out, r#"<{name} xsi:type="xsd:boolean">{v}</{name}>"#),
            SoapValue::Date(d) => write!(
                out,
                r#"<{name} xsi:type="xsd:date">{}</{name}>"#,
                format_date(*d)
            ),
            SoapValue::Nil => write!(out, r#"<{name} xsi:nil="true"/>"#),
            SoapValue::Struct { type_name, fields } => {
                write!(out, r#"<{name} xsi:type="ns1:{type_name}">"#)?;
                for (field, value) in fields {
                    value.write_to(field, out)?;
                }
                write!(out, "</{name}>")
            }
        }
    }
}

/// A single RPC call
#[derive(Debug, Clone, PartialEq)]
pub struct SoapRequest {
    /// Operation name (e.g. `getCampaigns`)
    pub operation: String,
    /// Ordered parameters
    pub params: Vec<(String, SoapValue)>,
}

impl SoapRequest {
    /// Create a request with no parameters
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: SoapValue) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// `SOAPAction` header value for this operation
    pub fn action(&self, namespace: &str) -> String {
        format!("\"{}/{}\"", namespace.trim_end_matches('/'), self.operation)
    }

    /// Render the full envelope
    pub fn to_envelope(&self, namespace: &str) -> String {
        let mut out = String::with_capacity(512);
        // Writing into a String cannot fail
        let _ = self.write_envelope(namespace, &mut out);
        out
    }

    fn write_envelope(&self, namespace: &str, out: &mut String) -> fmt::Result {
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        write!(
            out,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="{SOAP_ENV_NS}" xmlns:ns1="{}" xmlns:xsd="{XSD_NS}" xmlns:xsi="{XSI_NS}" xmlns:SOAP-ENC="{SOAP_ENC_NS}" SOAP-ENV:encodingStyle="{SOAP_ENC_NS}">"#,
            escape(namespace)
        )?;
        out.push_str("<SOAP-ENV:Body>");
        write!(out, "<ns1:{}>", self.operation)?;
        for (name, value) in &self.params {
            value.write_to(name, out)?;
        }
        write!(out, "</ns1:{}>", self.operation)?;
        out.push_str("</SOAP-ENV:Body></SOAP-ENV:Envelope>");
        Ok(())
    }
}
