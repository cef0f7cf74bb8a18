//! Tool description and raw channel ingestion (the Channel Provider contract).
pub mod channels;
pub mod geometry;

pub use channels::{ButtonChannel, ButtonId, ChannelDump, DensityLog, RawChannelSet, NULL_VALUE};
pub use geometry::{ButtonOrder, PadGeometry, PadLayout, ToolGeometry};
