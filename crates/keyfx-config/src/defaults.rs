// Serde defaults for behavior timing fields, in milliseconds.

pub(crate) const TOGGLE_IN_HOLD_MS: u64 = 200;
pub(crate) const HOLD_IN_TOGGLE_MS: u64 = 200;
pub(crate) const HOLD_IN_TOGGLE_PRESS_MS: u64 = 0;
pub(crate) const CONTINUOUS_INTERVAL_MS: u64 = 100;
pub(crate) const CONTINUOUS_PRESS_MS: u64 = 20;
pub(crate) const MULTI_CLICK_MS: u64 = 200;
pub(crate) const SECONDARY_NTH_CLICK: usize = 2;
pub(crate) const SECONDARY_MS: u64 = 200;
pub(crate) const FIX_DOUBLE_CLICK_MS: u64 = 10;
pub(crate) const LONG_SHORT_MS: u64 = 300;

pub(crate) const fn default_toggle_in_hold_ms() -> u64 {
    TOGGLE_IN_HOLD_MS
}
pub(crate) const fn default_hold_in_toggle_ms() -> u64 {
    HOLD_IN_TOGGLE_MS
}
pub(crate) const fn default_hold_in_toggle_press_ms() -> u64 {
    HOLD_IN_TOGGLE_PRESS_MS
}
pub(crate) const fn default_continuous_interval_ms() -> u64 {
    CONTINUOUS_INTERVAL_MS
}
pub(crate) const fn default_continuous_press_ms() -> u64 {
    CONTINUOUS_PRESS_MS
}
pub(crate) const fn default_multi_click_ms() -> u64 {
    MULTI_CLICK_MS
}
pub(crate) const fn default_secondary_nth_click() -> usize {
    SECONDARY_NTH_CLICK
}
pub(crate) const fn default_secondary_ms() -> u64 {
    SECONDARY_MS
}
pub(crate) const fn default_fix_double_click_ms() -> u64 {
    FIX_DOUBLE_CLICK_MS
}
pub(crate) const fn default_long_short_ms() -> u64 {
    LONG_SHORT_MS
}

pub(crate) fn default_secondary_mode() -> String {
    "replace".to_string()
}
pub(crate) fn default_hook_mode() -> String {
    "release".to_string()
}
