//! XML-RPC encoding for the Robot Framework remote library protocol
//!
//! Only what the remote protocol needs: method calls with typed params,
//! and method responses holding either one value or a fault.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::common::{Error, Result};

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    /// `base64` payloads are kept in their encoded form
    Base64(String),
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

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Member of a struct value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|m| m.get(key))
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) => {
                let _ = write!(out, "<int>{}</int>", i);
            }
            Value::Bool(b) => {
                let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
            }
            Value::String(s) => {
                let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
            }
            Value::Double(d) => {
                let _ = write!(out, "<double>{}</double>", d);
            }
            Value::Base64(b) => {
                let _ = write!(out, "<base64>{}</base64>", escape(b.as_str()));
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Scenario files carry arguments as JSON-compatible data
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Double(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Struct(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Encode a `methodCall` document
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Decode a `methodResponse` document into its single value.
///
/// A `<fault>` response becomes [`Error::RemoteFault`]; a response without
/// params (legal for procedures returning nothing) decodes to [`Value::Nil`].
pub fn decode_response(xml: &str) -> Result<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(protocol(format!("expected methodResponse, got <{}>", root.name)));
    }

    if let Some(fault) = root.child("fault") {
        let value = decode_value(fault.required("value")?)?;
        let code = value.get("faultCode").and_then(Value::as_i64).unwrap_or(0);
        let message = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or("unknown fault")
            .to_string();
        return Err(Error::RemoteFault { code, message });
    }

    match root.child("params").and_then(|p| p.child("param")) {
        Some(param) => decode_value(param.required("value")?),
        None => Ok(Value::Nil),
    }
}

fn protocol(message: impl Into<String>) -> Error {
    Error::RemoteProtocol(message.into())
}

/// Element tree built from the response before interpretation
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required(&self, name: &str) -> Result<&Node> {
        self.child(name)
            .ok_or_else(|| protocol(format!("<{}> without <{}>", self.name, name)))
    }
}

fn parse_tree(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Node> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| protocol(format!("malformed XML: {}", e)))?;
        match event {
            Event::Start(start) => {
                stack.push(Node {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    ..Node::default()
                });
            }
            Event::Empty(empty) => {
                let node = Node {
                    name: String::from_utf8_lossy(empty.name().as_ref()).into_owned(),
                    ..Node::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| protocol(format!("bad text: {}", e)))?;
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| protocol("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Eof => return Err(protocol("unexpected end of document")),
            _ => {}
        }
    }
}

fn decode_value(node: &Node) -> Result<Value> {
    // <value>text</value> without a type element is a string
    let Some(typed) = node.children.first() else {
        return Ok(Value::String(node.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse()
            .map(Value::Int)
            .map_err(|_| protocol(format!("invalid int '{}'", text))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(protocol(format!("invalid boolean '{}'", other))),
        },
        "double" => text
            .parse()
            .map(Value::Double)
            .map_err(|_| protocol(format!("invalid double '{}'", text))),
        "string" => Ok(Value::String(typed.text.clone())),
        "base64" => Ok(Value::Base64(text.to_string())),
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = typed.required("data")?;
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
                let name = member.required("name")?.text.clone();
                let value = decode_value(member.required("value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(protocol(format!("unsupported value type <{}>", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_run_keyword_call() {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("maxSeconds".to_string(), Value::Int(30));
        let xml = encode_call(
            "run_keyword",
            &[
                "set_max_keyword_duration".into(),
                Value::Array(vec![]),
                Value::Struct(kwargs),
            ],
        );
        assert!(xml.contains("<methodName>run_keyword</methodName>"));
        assert!(xml.contains(
            "<param><value><string>set_max_keyword_duration</string></value></param>"
        ));
        assert!(xml.contains("<param><value><array><data></data></array></value></param>"));
        assert!(xml.contains(
            "<member><name>maxSeconds</name><value><int>30</int></value></member>"
        ));
    }

    #[test]
    fn test_encode_escapes_text() {
        let xml = encode_call("run_keyword", &["a < b & \"c\"".into()]);
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_decode_keyword_result() {
        let xml = r#"<?xml version='1.0'?>
<methodResponse>
<params>
<param>
<value><struct>
<member><name>status</name><value><string>PASS</string></value></member>
<member><name>return</name><value><int>4</int></value></member>
<member><name>output</name><value>*INFO* speech index 4</value></member>
<member><name>flags</name><value><array><data><value><boolean>1</boolean></value><value><nil/></value></data></array></value></member>
</struct></value>
</param>
</params>
</methodResponse>"#;
        let value = decode_response(xml).unwrap();
        assert_eq!(value.get("status").and_then(Value::as_str), Some("PASS"));
        assert_eq!(value.get("return"), Some(&Value::Int(4)));
        assert_eq!(
            value.get("output").and_then(Value::as_str),
            Some("*INFO* speech index 4")
        );
        assert_eq!(
            value.get("flags"),
            Some(&Value::Array(vec![Value::Bool(true), Value::Nil]))
        );
    }

    #[test]
    fn test_decode_preserves_string_whitespace_and_entities() {
        let xml = "<methodResponse><params><param><value><string>  a &amp; b </string></value></param></params></methodResponse>";
        assert_eq!(decode_response(xml).unwrap(), Value::String("  a & b ".to_string()));
    }

    #[test]
    fn test_decode_fault() {
        let xml = r#"<methodResponse><fault><value><struct>
<member><name>faultCode</name><value><int>1</int></value></member>
<member><name>faultString</name><value><string>No such keyword</string></value></member>
</struct></value></fault></methodResponse>"#;
        match decode_response(xml).unwrap_err() {
            Error::RemoteFault { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "No such keyword");
            }
            other => panic!("Expected RemoteFault, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_response("<html><body>nope</body></html>"),
            Err(Error::RemoteProtocol(_))
        ));
        assert!(matches!(
            decode_response("<methodResponse><params>"),
            Err(Error::RemoteProtocol(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(serde_json::json!({"speech": ["a", 1, 1.5, null]}));
        assert_eq!(
            value.get("speech"),
            Some(&Value::Array(vec![
                Value::String("a".to_string()),
                Value::Int(1),
                Value::Double(1.5),
                Value::Nil,
            ]))
        );
    }
}
