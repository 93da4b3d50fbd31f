//! argonrec-detinfo: Detector condition providers.
//!
//! Relates spatial position along the drift axis to readout ticks and
//! simulation TDC counts, and carries the liquid-argon physics used by the
//! track fit: drift velocity, recombination corrections, and restricted
//! mean energy loss.

pub mod clocks;
pub mod conditions;
pub mod detprops;
pub mod inherit;
pub mod larprops;
pub mod providers;

pub use clocks::DetectorClocks;
pub use conditions::{ChannelMapping, ConditionsDb, ConditionsPolicy, ConditionsRecord, RunId};
pub use detprops::{DetPropsConfig, DetectorProperties};
pub use larprops::{LarProperties, Sternheimer};
pub use providers::Providers;
