//! Borrowed bundle of the providers a reconstruction stage consumes.

use argonrec_signal::fft::LarFft;

use crate::clocks::DetectorClocks;
use crate::detprops::DetectorProperties;
use crate::larprops::LarProperties;

/// The provider set handed to reconstruction algorithms.
///
/// Algorithms borrow the whole pack instead of threading four separate
/// references; the pack owns nothing and is cheap to copy.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub fft: &'a LarFft,
    pub clocks: &'a DetectorClocks,
    pub detprop: &'a DetectorProperties,
    pub larprop: &'a LarProperties,
}

impl<'a> Providers<'a> {
    #[must_use]
    pub fn new(
        fft: &'a LarFft,
        clocks: &'a DetectorClocks,
        detprop: &'a DetectorProperties,
        larprop: &'a LarProperties,
    ) -> Self {
        Self {
            fft,
            clocks,
            detprop,
            larprop,
        }
    }
}
