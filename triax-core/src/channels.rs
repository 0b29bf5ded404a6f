//! Sensor channels and the median aggregator
//!
//! Four channels feed the rig: three bridges on the shared clock line and
//! one pressure transducer on a commodity ADC. Between aggregation ticks
//! each channel collects every sample the worker produced; the aggregator
//! reduces that batch to its median.
//!
//! ## Why a median
//!
//! A single bad clock edge flips one bit of one word, which can throw one
//! sample far off. The median of a batch ignores it completely, where a
//! mean would smear it over the whole period.
//!
//! ```text
//! samples:  1.02 1.01 1.03 -812.4 1.02   → median 1.02
//! ```

use crate::calibration::CalibrationMap;
use crate::constants::acquisition::CHANNEL_COUNT;

/// One of the rig's four sensor channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Axial load cell (bridge 0)
    AxialLoad,
    /// Axial displacement gauge (bridge 1)
    Displacement,
    /// Drain tank load cell (bridge 2)
    TankLoad,
    /// Hydraulic pressure (external ADC)
    HydraulicPressure,
}

impl Channel {
    /// Every channel in index order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::AxialLoad,
        Channel::Displacement,
        Channel::TankLoad,
        Channel::HydraulicPressure,
    ];

    /// Bridge channels, in driver device order
    pub const BRIDGES: [Channel; 3] =
        [Channel::AxialLoad, Channel::Displacement, Channel::TankLoad];

    /// Position in per-channel arrays
    pub const fn index(self) -> usize {
        match self {
            Channel::AxialLoad => 0,
            Channel::Displacement => 1,
            Channel::TankLoad => 2,
            Channel::HydraulicPressure => 3,
        }
    }

    /// Channel at `index`, if any
    pub const fn from_index(index: usize) -> Option<Channel> {
        match index {
            0 => Some(Channel::AxialLoad),
            1 => Some(Channel::Displacement),
            2 => Some(Channel::TankLoad),
            3 => Some(Channel::HydraulicPressure),
            _ => None,
        }
    }

    /// Log column heading for the denoised input value
    pub const fn input_label(self) -> &'static str {
        match self {
            Channel::AxialLoad => "CH0_Vol(V)",
            Channel::Displacement => "CH1_Vol(V)",
            Channel::TankLoad => "CH2_Vol(V)",
            Channel::HydraulicPressure => "CH3_Vol(V)",
        }
    }

    /// Log column heading for the physical value
    pub const fn physical_label(self) -> &'static str {
        match self {
            Channel::AxialLoad => "CH0_Load_Cell_(Odo)",
            Channel::Displacement => "CH1_Displacement_Gauge",
            Channel::TankLoad => "CH2_Load_Cell_(Tank)",
            Channel::HydraulicPressure => "CH3_Hydraulic_Pressure",
        }
    }
}

/// Median of a batch, reordering it in place
///
/// Odd counts give the middle value, even counts the mean of the two
/// middle values. `None` for an empty batch.
///
/// ```rust
/// use triax_core::channels::median;
///
/// assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
/// assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
/// assert_eq!(median(&mut []), None);
/// ```
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    values.sort_unstable_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Latest state of every channel as seen by the main loop
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelBank {
    input: [f32; CHANNEL_COUNT],
    physical: [f32; CHANNEL_COUNT],
    fresh: [bool; CHANNEL_COUNT],
}

impl ChannelBank {
    /// Bank with every value at zero and nothing fresh
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce one channel's drained batch and publish the result
    ///
    /// An empty batch leaves the channel untouched and returns `false`.
    /// Otherwise the median becomes the input value, the physical value is
    /// recomputed with `calibration` and the channel is marked fresh.
    pub fn publish(
        &mut self,
        channel: Channel,
        batch: &mut [f32],
        calibration: &CalibrationMap,
    ) -> bool {
        let Some(value) = median(batch) else {
            return false;
        };

        let i = channel.index();
        self.input[i] = value;
        self.physical[i] = calibration.apply(channel, value);
        self.fresh[i] = true;
        true
    }

    /// Re-derive every physical value after a calibration change
    pub fn recalibrate(&mut self, calibration: &CalibrationMap) {
        for channel in Channel::ALL {
            let i = channel.index();
            self.physical[i] = calibration.apply(channel, self.input[i]);
        }
    }

    /// Denoised input value
    pub fn input(&self, channel: Channel) -> f32 {
        self.input[channel.index()]
    }

    /// Calibrated physical value
    pub fn physical(&self, channel: Channel) -> f32 {
        self.physical[channel.index()]
    }

    /// All input values in channel order
    pub fn inputs(&self) -> &[f32; CHANNEL_COUNT] {
        &self.input
    }

    /// All physical values in channel order
    pub fn physicals(&self) -> &[f32; CHANNEL_COUNT] {
        &self.physical
    }

    /// Whether the channel published since the last [`clear_fresh`](Self::clear_fresh)
    pub fn is_fresh(&self, channel: Channel) -> bool {
        self.fresh[channel.index()]
    }

    /// True once every channel has published since the last clear
    pub fn all_fresh(&self) -> bool {
        self.fresh.iter().all(|&fresh| fresh)
    }

    /// Forget freshness, typically right after a log row
    pub fn clear_fresh(&mut self) {
        self.fresh = [false; CHANNEL_COUNT];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut [7.0]), Some(7.0));
    }

    #[test]
    fn median_rejects_glitch() {
        let mut batch = [1.02, 1.01, 1.03, -812.4, 1.02];
        assert_eq!(median(&mut batch), Some(1.02));
    }

    proptest! {
        #[test]
        fn median_within_batch_bounds(mut batch in prop::collection::vec(-1.0e6f32..1.0e6, 1..100)) {
            let lo = batch.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = batch.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let m = median(&mut batch).unwrap();
            prop_assert!(m >= lo && m <= hi);
        }
    }

    #[test]
    fn empty_batch_leaves_channel_stale() {
        let calibration = CalibrationMap::default();
        let mut bank = ChannelBank::new();
        assert!(bank.publish(Channel::Displacement, &mut [5.0], &calibration));
        bank.clear_fresh();

        assert!(!bank.publish(Channel::Displacement, &mut [], &calibration));
        assert_eq!(bank.input(Channel::Displacement), 5.0);
        assert!(!bank.is_fresh(Channel::Displacement));
    }

    #[test]
    fn freshness_needs_every_channel() {
        let calibration = CalibrationMap::default();
        let mut bank = ChannelBank::new();
        for channel in Channel::BRIDGES {
            bank.publish(channel, &mut [1.0], &calibration);
        }
        assert!(!bank.all_fresh());

        bank.publish(Channel::HydraulicPressure, &mut [0.5], &calibration);
        assert!(bank.all_fresh());

        bank.clear_fresh();
        assert!(!bank.all_fresh());
    }

    #[test]
    fn recalibrate_follows_new_slope() {
        let mut calibration = CalibrationMap::default();
        let mut bank = ChannelBank::new();
        bank.publish(Channel::AxialLoad, &mut [2.0], &calibration);

        calibration.set_slope(Channel::AxialLoad, 10.0);
        bank.recalibrate(&calibration);
        assert_eq!(bank.physical(Channel::AxialLoad), 20.0);
    }

    #[test]
    fn index_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_index(channel.index()), Some(channel));
        }
        assert_eq!(Channel::from_index(4), None);
    }
}
