//! Static signal identification tables.
//!
//! Frequency to service label, MAC prefix to manufacturer, and the small
//! classification helpers used when normalising scan output.

mod classify;
mod frequency;
mod oui;

pub use classify::{
    classify_bluetooth_device, wifi_channel_to_mhz, wifi_mhz_to_channel, GENERIC_BLUETOOTH,
};
pub use frequency::{identify_frequency, FrequencyId, EXACT_TOLERANCE_MHZ};
pub use oui::{lookup_oui, manufacturer_or_unknown, UNKNOWN_MANUFACTURER};
