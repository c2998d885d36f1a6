//! Values flowing along connections.
//!
//! Every buffer is produced once and shared read-only downstream, so cloning
//! a [`Signal`] only bumps a reference count.

use std::sync::Arc;

use crate::kind::PortType;

/// One tick's output of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Interleaved IQ samples.
    Iq(Arc<[f32]>),
    /// Real audio samples.
    Audio(Arc<[f32]>),
    /// A dB spectrum row.
    Spectrum(Arc<[f32]>),
    /// Bits, one per byte (0 or 1).
    Bits(Arc<[u8]>),
    /// A single measurement.
    Scalar(f32),
}

impl Signal {
    /// Port type this signal travels on.
    pub fn port_type(&self) -> PortType {
        match self {
            Signal::Iq(_) => PortType::Iq,
            Signal::Audio(_) => PortType::Audio,
            Signal::Spectrum(_) => PortType::Spectrum,
            Signal::Bits(_) => PortType::Bits,
            Signal::Scalar(_) => PortType::Scalar,
        }
    }

    /// The float buffer, for every variant except bits and scalars.
    pub fn samples(&self) -> Option<&[f32]> {
        match self {
            Signal::Iq(s) | Signal::Audio(s) | Signal::Spectrum(s) => Some(s),
            Signal::Bits(_) | Signal::Scalar(_) => None,
        }
    }

    /// Number of values carried (complex samples count twice).
    pub fn len(&self) -> usize {
        match self {
            Signal::Iq(s) | Signal::Audio(s) | Signal::Spectrum(s) => s.len(),
            Signal::Bits(b) => b.len(),
            Signal::Scalar(_) => 1,
        }
    }

    /// True if the signal carries no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wraps `samples` in the same variant as `self`. Bits and scalars
    /// become audio.
    pub(crate) fn same_kind(&self, samples: Vec<f32>) -> Signal {
        match self {
            Signal::Iq(_) => Signal::Iq(samples.into()),
            Signal::Spectrum(_) => Signal::Spectrum(samples.into()),
            Signal::Audio(_) | Signal::Bits(_) | Signal::Scalar(_) => Signal::Audio(samples.into()),
        }
    }
}
