//! The closed set of node kinds and their port signatures.

use serde::{Deserialize, Serialize};

/// Type carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    /// Interleaved complex baseband samples.
    Iq,
    /// Real audio samples.
    Audio,
    /// One dB spectrum row.
    Spectrum,
    /// Decoded bits, one per byte.
    Bits,
    /// A single measurement.
    Scalar,
    /// Wildcard: compatible with every type.
    Any,
}

impl PortType {
    /// True if a port of type `self` may feed a port of type `other`.
    pub fn compatible_with(self, other: PortType) -> bool {
        self == other || self == PortType::Any || other == PortType::Any
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortType::Iq => "iq",
            PortType::Audio => "audio",
            PortType::Spectrum => "spectrum",
            PortType::Bits => "bits",
            PortType::Scalar => "scalar",
            PortType::Any => "any",
        };
        f.write_str(name)
    }
}

/// A named, typed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Port name used in connection descriptions.
    pub name: &'static str,
    /// Signal type.
    pub ty: PortType,
}

const fn port(name: &'static str, ty: PortType) -> PortSpec {
    PortSpec { name, ty }
}

const NONE: &[PortSpec] = &[];
const IQ_IN: &[PortSpec] = &[port("in", PortType::Iq)];
const IQ_OUT: &[PortSpec] = &[port("out", PortType::Iq)];
const AUDIO_IN: &[PortSpec] = &[port("in", PortType::Audio)];
const AUDIO_OUT: &[PortSpec] = &[port("out", PortType::Audio)];
const SPECTRUM_IN: &[PortSpec] = &[port("in", PortType::Spectrum)];
const SPECTRUM_OUT: &[PortSpec] = &[port("out", PortType::Spectrum)];
const BITS_OUT: &[PortSpec] = &[port("out", PortType::Bits)];
const SCALAR_OUT: &[PortSpec] = &[port("out", PortType::Scalar)];
const ANY_IN: &[PortSpec] = &[port("in", PortType::Any)];
const ANY_OUT: &[PortSpec] = &[port("out", PortType::Any)];

/// Broad role of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Produces samples without inputs.
    Source,
    /// Shapes samples.
    Filter,
    /// Turns IQ into audio.
    Demodulator,
    /// Turns audio into symbols.
    Decoder,
    /// Measures signals.
    Analysis,
    /// Terminal sink; produces no data.
    Output,
    /// Explicit fan-in point.
    Combiner,
    /// Kind name not recognized.
    Unknown,
}

/// Every node kind the engine can evaluate.
///
/// Descriptions name kinds by their snake_case string. Unrecognized names
/// load as [`NodeKind::Unknown`], which evaluates to no output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Complex exponential test tone.
    Tone,
    /// IQ pulled from a host-attached [`IqSource`](crate::IqSource).
    IqInput,
    /// FIR filter with history carried across ticks.
    Fir,
    /// FM discriminator.
    FmDemod,
    /// AM envelope detector.
    AmDemod,
    /// Threshold slicer producing bits.
    Slicer,
    /// Windowed power spectrum.
    Spectrum,
    /// Signal level in dB.
    LevelMeter,
    /// Buffers spectrum rows and draws them on a render surface.
    SpectrumDisplay,
    /// Writes audio to a host-attached output.
    AudioOut,
    /// Accumulates samples for later inspection.
    Recorder,
    /// Sums or averages several inputs.
    Combiner,
    /// Unrecognized kind name, kept for diagnostics.
    Unknown(String),
}

impl NodeKind {
    /// Every recognized kind.
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Tone,
        NodeKind::IqInput,
        NodeKind::Fir,
        NodeKind::FmDemod,
        NodeKind::AmDemod,
        NodeKind::Slicer,
        NodeKind::Spectrum,
        NodeKind::LevelMeter,
        NodeKind::SpectrumDisplay,
        NodeKind::AudioOut,
        NodeKind::Recorder,
        NodeKind::Combiner,
    ];

    /// Description name of this kind.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Tone => "tone",
            NodeKind::IqInput => "iq_input",
            NodeKind::Fir => "fir",
            NodeKind::FmDemod => "fm_demod",
            NodeKind::AmDemod => "am_demod",
            NodeKind::Slicer => "slicer",
            NodeKind::Spectrum => "spectrum",
            NodeKind::LevelMeter => "level_meter",
            NodeKind::SpectrumDisplay => "spectrum_display",
            NodeKind::AudioOut => "audio_out",
            NodeKind::Recorder => "recorder",
            NodeKind::Combiner => "combiner",
            NodeKind::Unknown(name) => name,
        }
    }

    /// Role of this kind.
    pub fn category(&self) -> NodeCategory {
        match self {
            NodeKind::Tone | NodeKind::IqInput => NodeCategory::Source,
            NodeKind::Fir => NodeCategory::Filter,
            NodeKind::FmDemod | NodeKind::AmDemod => NodeCategory::Demodulator,
            NodeKind::Slicer => NodeCategory::Decoder,
            NodeKind::Spectrum | NodeKind::LevelMeter => NodeCategory::Analysis,
            NodeKind::SpectrumDisplay | NodeKind::AudioOut | NodeKind::Recorder => {
                NodeCategory::Output
            }
            NodeKind::Combiner => NodeCategory::Combiner,
            NodeKind::Unknown(_) => NodeCategory::Unknown,
        }
    }

    /// Input ports.
    pub fn inputs(&self) -> &'static [PortSpec] {
        match self {
            NodeKind::Tone | NodeKind::IqInput => NONE,
            NodeKind::FmDemod | NodeKind::AmDemod | NodeKind::Spectrum => IQ_IN,
            NodeKind::Slicer | NodeKind::AudioOut => AUDIO_IN,
            NodeKind::SpectrumDisplay => SPECTRUM_IN,
            NodeKind::Fir
            | NodeKind::LevelMeter
            | NodeKind::Recorder
            | NodeKind::Combiner
            | NodeKind::Unknown(_) => ANY_IN,
        }
    }

    /// Output ports.
    pub fn outputs(&self) -> &'static [PortSpec] {
        match self {
            NodeKind::Tone | NodeKind::IqInput => IQ_OUT,
            NodeKind::FmDemod | NodeKind::AmDemod => AUDIO_OUT,
            NodeKind::Slicer => BITS_OUT,
            NodeKind::Spectrum => SPECTRUM_OUT,
            NodeKind::LevelMeter => SCALAR_OUT,
            NodeKind::SpectrumDisplay | NodeKind::AudioOut | NodeKind::Recorder => NONE,
            NodeKind::Fir | NodeKind::Combiner | NodeKind::Unknown(_) => ANY_OUT,
        }
    }

    /// True if several connections may feed this kind.
    pub fn accepts_fan_in(&self) -> bool {
        matches!(self, NodeKind::Combiner)
    }

    /// Input port named `name`.
    pub fn input(&self, name: &str) -> Option<PortSpec> {
        self.inputs().iter().copied().find(|p| p.name == name)
    }

    /// Output port named `name`.
    pub fn output(&self, name: &str) -> Option<PortSpec> {
        self.outputs().iter().copied().find(|p| p.name == name)
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or(NodeKind::Unknown(name))
    }
}

impl From<&str> for NodeKind {
    fn from(name: &str) -> Self {
        NodeKind::from(name.to_string())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from(kind.name()), kind);
        }
        assert_eq!(
            NodeKind::from("pocsag_decoder"),
            NodeKind::Unknown("pocsag_decoder".to_string())
        );
    }

    #[test]
    fn wildcard_is_compatible_with_everything() {
        assert!(PortType::Any.compatible_with(PortType::Bits));
        assert!(PortType::Spectrum.compatible_with(PortType::Any));
        assert!(PortType::Iq.compatible_with(PortType::Iq));
        assert!(!PortType::Audio.compatible_with(PortType::Iq));
    }

    #[test]
    fn sinks_have_no_outputs() {
        for kind in NodeKind::ALL {
            if kind.category() == NodeCategory::Output {
                assert!(kind.outputs().is_empty(), "{kind}");
            }
        }
        assert!(NodeKind::Tone.inputs().is_empty());
        assert!(NodeKind::Combiner.accepts_fan_in());
        assert!(!NodeKind::Fir.accepts_fan_in());
    }

    #[test]
    fn kind_deserializes_from_string() {
        let kind: NodeKind = serde_json::from_str("\"fm_demod\"").unwrap();
        assert_eq!(kind, NodeKind::FmDemod);
        let kind: NodeKind = serde_json::from_str("\"waterfall3d\"").unwrap();
        assert_eq!(kind.category(), NodeCategory::Unknown);
        assert_eq!(serde_json::to_string(&NodeKind::AudioOut).unwrap(), "\"audio_out\"");
    }
}
