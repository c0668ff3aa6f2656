use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::debug;

use super::{Connector, IndexSession};
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::models::ReleaseArtifact;

/// An XML-RPC value, restricted to the types the index emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }
}

/// A call parameter. The index methods only take strings and string lists.
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    Str(&'a str),
    List(&'a [String]),
}

impl Param<'_> {
    fn write(&self, out: &mut String) {
        match self {
            Param::Str(s) => write_string(out, s),
            Param::List(items) => {
                out.push_str("<value><array><data>");
                for item in items.iter() {
                    write_string(out, item);
                }
                out.push_str("</data></array></value>");
            }
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str("<value><string>");
    out.push_str(&escape(s));
    out.push_str("</string></value>");
}

/// Serialize a `methodCall` document.
pub fn encode_call(method: &str, params: &[Param<'_>]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Parse a `methodResponse` document into its single return value.
///
/// Faults become [`Error::Fault`]; anything that is not a well-formed response,
/// including an empty body, becomes [`Error::MalformedResponse`].
pub fn decode_response(xml: &str) -> Result<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(malformed(format!("unexpected root element <{}>", root.name)));
    }

    if let Some(fault) = root.child("fault") {
        let value = decode_value(fault.child("value").ok_or_else(|| malformed("empty fault"))?)?;
        let code = match value.get("faultCode") {
            Some(Value::Int(code)) => *code,
            _ => 0,
        };
        let message = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(Error::Fault { code, message });
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| malformed("response carries no value"))?;
    decode_value(value)
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedResponse(reason.into())
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Element {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Element::default()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(Element::named(e.name().local_name().as_ref())),
            Ok(Event::Empty(ref e)) => {
                let element = Element::named(e.name().local_name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| malformed(err.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(malformed("unbalanced closing tag"));
                }
                if let Some(element) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(malformed(err.to_string())),
        }
    }

    if stack.len() != 1 {
        return Err(malformed("unclosed element"));
    }
    stack
        .pop()
        .and_then(|document| document.children.into_iter().next())
        .ok_or_else(|| malformed("no element found"))
}

fn decode_value(value: &Element) -> Result<Value> {
    let Some(typed) = value.children.first() else {
        // A bare <value> defaults to string.
        return Ok(Value::String(value.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "string" | "dateTime.iso8601" | "base64" => Ok(Value::String(typed.text.clone())),
        "int" | "i4" | "i8" => text
            .parse()
            .map(Value::Int)
            .map_err(|_| malformed(format!("invalid integer {text:?}"))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(malformed(format!("invalid boolean {other:?}"))),
        },
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| malformed(format!("invalid double {text:?}"))),
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = typed.child("data").ok_or_else(|| malformed("array without data"))?;
            data.children
                .iter()
                .filter(|c| c.name == "value")
                .map(decode_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.child("name").ok_or_else(|| malformed("member without name"))?;
                let value = member.child("value").ok_or_else(|| malformed("member without value"))?;
                members.insert(name.text.clone(), decode_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(malformed(format!("unsupported value type <{other}>"))),
    }
}

fn strings(value: Value) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(malformed("expected an array"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(malformed(format!("expected a string, got {other:?}"))),
        })
        .collect()
}

fn browse_hits(value: Value) -> Result<Vec<(String, String)>> {
    let Value::Array(rows) = value else {
        return Err(malformed("expected an array of projects"));
    };
    rows.iter()
        .map(|row| {
            let fields = row.as_array().unwrap_or_default();
            let name = fields
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("browse row without a project name"))?;
            let version = fields.get(1).and_then(Value::as_str).unwrap_or_default();
            Ok((name.to_string(), version.to_string()))
        })
        .collect()
}

fn artifacts(value: Value) -> Result<Vec<ReleaseArtifact>> {
    let Value::Array(entries) = value else {
        return Err(malformed("expected an array of release files"));
    };
    Ok(entries
        .iter()
        .map(|entry| ReleaseArtifact {
            packagetype: entry
                .get("packagetype")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            url: entry.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
            filename: entry.get("filename").and_then(Value::as_str).map(str::to_string),
        })
        .collect())
}

/// Opens XML-RPC sessions against the configured index endpoint.
pub struct XmlRpcConnector {
    client: Client,
    endpoint: String,
}

impl XmlRpcConnector {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

/// Build the HTTP client shared by the RPC session and classifier discovery.
pub fn http_client(config: &IndexConfig) -> Result<Client> {
    let mut builder = Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

#[async_trait]
impl Connector for XmlRpcConnector {
    type Session = XmlRpcSession;

    async fn open(&self) -> Result<XmlRpcSession> {
        debug!(endpoint = %self.endpoint, "opening index session");
        Ok(XmlRpcSession {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
        })
    }
}

pub struct XmlRpcSession {
    client: Client,
    endpoint: String,
}

impl XmlRpcSession {
    async fn call(&self, method: &str, params: &[Param<'_>]) -> Result<Value> {
        debug!(method, "index call");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/xml")
            .body(encode_call(method, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteFetch {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        decode_response(&body)
    }
}

#[async_trait]
impl IndexSession for XmlRpcSession {
    async fn browse(&self, classifiers: &[String]) -> Result<Vec<(String, String)>> {
        browse_hits(self.call("browse", &[Param::List(classifiers)]).await?)
    }

    async fn list_packages(&self) -> Result<Vec<String>> {
        strings(self.call("list_packages", &[]).await?)
    }

    async fn package_releases(&self, name: &str) -> Result<Vec<String>> {
        strings(self.call("package_releases", &[Param::Str(name)]).await?)
    }

    async fn release_urls(&self, name: &str, version: &str) -> Result<Vec<ReleaseArtifact>> {
        let params = [Param::Str(name), Param::Str(version)];
        artifacts(self.call("release_urls", &params).await?)
    }

    async fn close(&self) -> Result<()> {
        // HTTP transport is per request; nothing stays open between calls.
        debug!(endpoint = %self.endpoint, "closing index session");
        Ok(())
    }
}
