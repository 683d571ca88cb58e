//! # gonioview-bsdf
//!
//! Turns directionally sampled reflectance measurements into a renderable,
//! statistically annotated mesh and resolves screen-space selections back to
//! the sample points they cover.
//!
//! The pipeline for one incident-angle query is:
//!
//! 1. the [`SampleSource`](source::SampleSource) is queried for the outgoing
//!    directions and the luminance row ([`raw::RawMeasurement`]);
//! 2. the directions are mapped onto the unit disk and triangulated once
//!    ([`triangulation`]);
//! 3. per channel, heights, normals and statistics are derived lazily
//!    ([`channel::ChannelCache`]);
//! 4. screen rectangles are resolved into sample points and combined with the
//!    previous selection ([`selection`]);
//! 5. overlay rings and spokes are derived from the layout ([`path`]).
//!
//! [`dataset::BsdfDataset`] orchestrates the steps and [`arena::DatasetArena`]
//! owns the loaded datasets.

#![warn(missing_docs)]

pub mod arena;
pub mod channel;
pub mod config;
pub mod dataset;
pub mod path;
pub mod raw;
pub mod selection;
pub mod source;
pub mod spectrum;
pub mod triangulation;

pub use arena::DatasetArena;
pub use config::{HeightScale, PipelineConfig};
pub use dataset::BsdfDataset;
pub use source::{AnalyticSource, SampleSet, SampleSource, SourceError};
