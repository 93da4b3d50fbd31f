//! Calibrated wire signals as regions of interest.

use crate::ids::{Channel, SignalType, View};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A contiguous range of deconvolved samples above the noise threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionOfInterest {
    /// First tick of the region within the readout window.
    pub offset: u32,
    /// Deconvolved signal samples.
    pub data: Vec<f32>,
}

impl RegionOfInterest {
    /// Creates a region starting at `offset`.
    #[must_use]
    pub fn new(offset: u32, data: Vec<f32>) -> Self {
        Self { offset, data }
    }

    /// One-past-the-last tick of the region.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.offset + self.data.len() as u32
    }
}

/// Deconvolved signal of one channel, sparse over the readout window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Wire {
    /// Readout channel.
    pub channel: Channel,
    /// View of the channel's plane.
    pub view: View,
    /// Signal type of the channel's plane.
    pub signal_type: SignalType,
    /// Regions of interest, ordered by offset and non-overlapping.
    pub rois: Vec<RegionOfInterest>,
}

impl Wire {
    /// Creates a wire signal from its regions of interest.
    ///
    /// Regions are sorted by offset; overlap is the caller's bug and is
    /// asserted in debug builds.
    #[must_use]
    pub fn new(
        channel: Channel,
        view: View,
        signal_type: SignalType,
        mut rois: Vec<RegionOfInterest>,
    ) -> Self {
        rois.sort_by_key(|roi| roi.offset);
        debug_assert!(rois.windows(2).all(|w| w[0].end() <= w[1].offset));
        Self {
            channel,
            view,
            signal_type,
            rois,
        }
    }

    /// Signal value at an absolute tick; zero between regions.
    #[must_use]
    pub fn sample(&self, tick: u32) -> f32 {
        for roi in &self.rois {
            if tick >= roi.offset && tick < roi.end() {
                return roi.data[(tick - roi.offset) as usize];
            }
        }
        0.0
    }

    /// Densifies the signal over a window of `nticks`.
    #[must_use]
    pub fn to_dense(&self, nticks: usize) -> Vec<f32> {
        let mut dense = vec![0.0f32; nticks];
        for roi in &self.rois {
            let start = roi.offset as usize;
            for (i, &v) in roi.data.iter().enumerate() {
                if start + i < nticks {
                    dense[start + i] = v;
                }
            }
        }
        dense
    }
}
