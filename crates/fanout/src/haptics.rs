use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Fire-and-forget tactile feedback.
pub trait Haptics {
    fn impact(&self, style: ImpactStyle);
    fn selection_changed(&self);
}

/// Haptics for targets without a vibration motor: pulses are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn impact(&self, style: ImpactStyle) {
        log::debug!("haptic impact ({style})");
    }

    fn selection_changed(&self) {
        log::debug!("haptic selection tick");
    }
}
