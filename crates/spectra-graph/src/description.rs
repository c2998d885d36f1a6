//! Declarative pipeline description.
//!
//! This is the plain structure an editor or a configuration file supplies:
//! a list of nodes and a list of connections. It carries no runtime state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kind::NodeKind;

/// A whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescription {
    /// Nodes, in the order they were authored.
    #[serde(default)]
    pub nodes: Vec<NodeDescription>,
    /// Connections between node ports.
    #[serde(default)]
    pub connections: Vec<ConnectionDescription>,
}

impl PipelineDescription {
    /// Adds a node.
    pub fn node(mut self, id: &str, kind: NodeKind, params: Params) -> Self {
        self.nodes.push(NodeDescription {
            id: id.to_string(),
            kind,
            params,
        });
        self
    }

    /// Connects the default output of `source` to the default input of
    /// `target`. The connection id is derived from the endpoints.
    pub fn connect(mut self, source: &str, target: &str) -> Self {
        self.connections.push(ConnectionDescription::new(source, target));
        self
    }
}

/// One node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Unique node id.
    pub id: String,
    /// Node kind name.
    pub kind: NodeKind,
    /// Kind-specific parameters.
    #[serde(default, skip_serializing_if = "Params::is_empty")]
    pub params: Params,
}

/// One connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    /// Connection id, used in diagnostics.
    #[serde(default)]
    pub id: String,
    /// Producing node id.
    pub source: String,
    /// Producing port.
    #[serde(default = "default_output_port")]
    pub source_port: String,
    /// Consuming node id.
    pub target: String,
    /// Consuming port.
    #[serde(default = "default_input_port")]
    pub target_port: String,
}

fn default_output_port() -> String {
    "out".to_string()
}

fn default_input_port() -> String {
    "in".to_string()
}

impl ConnectionDescription {
    /// Connection between default ports.
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: format!("{source}->{target}"),
            source: source.to_string(),
            source_port: default_output_port(),
            target: target.to_string(),
            target_port: default_input_port(),
        }
    }
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Text, e.g. a window or filter kind name.
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Kind-specific parameter map.
///
/// Lookups are lenient: a missing key, or a value of the wrong type, falls
/// back to the caller's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    /// Empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Raw value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// True if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric value (integers widen).
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value as `f32`, or `default`.
    pub fn f32_or(&self, key: &str, default: f32) -> f32 {
        self.number(key).map_or(default, |v| v as f32)
    }

    /// Non-negative integer value, or `default`.
    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        match self.0.get(key) {
            Some(ParamValue::Int(v)) => usize::try_from(*v).unwrap_or(default),
            Some(ParamValue::Float(v)) if *v >= 0.0 && v.fract() == 0.0 => *v as usize,
            _ => default,
        }
    }

    /// Boolean value, or `default`.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.0.get(key) {
            Some(ParamValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Text value.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Parses a text value, or returns `default` when missing or invalid.
    pub fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.text(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_lookups() {
        let params = Params::new()
            .with("frequency", 1000_i64)
            .with("gain", 0.5)
            .with("window", "hann")
            .with("enabled", true);

        assert_eq!(params.f32_or("frequency", 0.0), 1000.0);
        assert_eq!(params.usize_or("frequency", 1), 1000);
        assert_eq!(params.usize_or("gain", 7), 7);
        assert_eq!(params.f32_or("missing", 3.0), 3.0);
        assert_eq!(params.text("window"), Some("hann"));
        assert!(params.bool_or("enabled", false));
        assert_eq!(params.parse_or("window", 0_u8), 0);
    }

    #[test]
    fn toml_pipeline() {
        let text = r#"
            [[nodes]]
            id = "tone"
            kind = "tone"
            params = { frequency = 1000, amplitude = 0.5 }

            [[nodes]]
            id = "fm"
            kind = "fm_demod"

            [[connections]]
            source = "tone"
            target = "fm"
        "#;
        let pipeline: PipelineDescription = toml::from_str(text).unwrap();
        assert_eq!(pipeline.nodes.len(), 2);
        assert_eq!(pipeline.nodes[0].params.f32_or("amplitude", 1.0), 0.5);
        assert_eq!(pipeline.nodes[1].kind, NodeKind::FmDemod);
        assert_eq!(pipeline.connections[0].source_port, "out");
        assert_eq!(pipeline.connections[0].target_port, "in");

        let again: PipelineDescription =
            toml::from_str(&toml::to_string(&pipeline).unwrap()).unwrap();
        assert_eq!(again, pipeline);
    }

    #[test]
    fn json_pipeline_with_unknown_kind() {
        let json = r#"{
            "nodes": [{ "id": "x", "kind": "ais_decoder", "params": { "mmsi": 12 } }],
            "connections": []
        }"#;
        let pipeline: PipelineDescription = serde_json::from_str(json).unwrap();
        assert_eq!(pipeline.nodes[0].kind, NodeKind::Unknown("ais_decoder".to_string()));
    }
}
