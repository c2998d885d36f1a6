//! Spectra Stream - bounded buffering between spectral producers and consumers
//!
//! Frames arrive at whatever rate the radio or network delivers them; the
//! display and pipeline consume at a fixed tick rate. This crate sits in
//! between:
//!
//! - [`SpectrumRing`] - fixed-capacity circular store of fixed-width rows with
//!   monotonic cursors, a `latest` row and zero-copy block assembly
//! - [`DrainPolicy`] / [`Drainer`] - one row per tick normally, two while the
//!   backlog exceeds a threshold
//!
//! # Example
//!
//! ```rust
//! use spectra_stream::{DrainPolicy, Drainer, SpectrumRing};
//!
//! let mut ring = SpectrumRing::new(64, 1024);
//! ring.push(&vec![-90.0; 1024]);
//!
//! let mut drainer = Drainer::new(DrainPolicy::default());
//! let drained = drainer.tick(&mut ring, |row| assert_eq!(row.len(), 1024));
//! assert_eq!(drained, 1);
//! ```
//!
//! The ring is single-writer, single-reader; `&mut` access enforces that.

pub mod drain;
pub mod ring;

pub use drain::{DEFAULT_BACKLOG_THRESHOLD, DrainPolicy, Drainer};
pub use ring::{MAX_RING_VALUES, RowBlock, SpectrumRing};
