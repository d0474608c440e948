use crate::action::ActionId;
use crate::config::RadialConfig;
use crate::geom::Point;
use crate::layout::ButtonTarget;

/// Visual growth factor for a button `distance` away from the pointer, in
/// `[1.0, 1.0 + boost]`. Independent of which button is active.
pub fn proximity_scale(distance: f64, max_distance: f64, boost: f64) -> f64 {
    if max_distance <= 0.0 {
        return 1.0;
    }
    1.0 + (1.0 - distance / max_distance).clamp(0.0, 1.0) * boost
}

/// Per-update scoring of every target against the pointer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoverFrame {
    pub scales: Vec<f64>,
    pub nearest: Option<(usize, f64)>,
    pub active: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverUpdate {
    pub changed: bool,
    pub haptic: bool,
}

impl HoverUpdate {
    pub fn new(changed: bool, haptic: bool) -> Self {
        Self { changed, haptic }
    }
}

/// Tracks which button the pointer is over.
///
/// A haptic pulse is requested once per contiguous dwell: entering a button
/// fires, lingering does not, and leaving into dead space re-arms it.
#[derive(Debug, Clone)]
pub struct HoverTracker {
    active: Option<ActionId>,
    last_haptic: Option<ActionId>,
    activation_distance: f64,
    proximity_distance: f64,
    boost: f64,
}

impl HoverTracker {
    pub fn new(cfg: &RadialConfig) -> Self {
        Self {
            active: None,
            last_haptic: None,
            activation_distance: cfg.activation_distance(),
            proximity_distance: cfg.proximity_distance(),
            boost: cfg.proximity_boost,
        }
    }

    pub fn active(&self) -> Option<&ActionId> {
        self.active.as_ref()
    }

    pub fn score(&self, targets: &[ButtonTarget], pointer: Point) -> HoverFrame {
        let mut nearest: Option<(usize, f64)> = None;
        let scales = targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let dist = target.center.distance(pointer);
                if nearest.is_none_or(|(_, best)| dist < best) {
                    nearest = Some((i, dist));
                }
                proximity_scale(dist, self.proximity_distance, self.boost)
            })
            .collect();

        let active = nearest
            .filter(|&(_, dist)| dist <= self.activation_distance)
            .map(|(i, _)| i);

        HoverFrame {
            scales,
            nearest,
            active,
        }
    }

    pub fn update(&mut self, targets: &[ButtonTarget], pointer: Point) -> (HoverFrame, HoverUpdate) {
        let frame = self.score(targets, pointer);
        let new_active = frame.active.map(|i| targets[i].id.clone());

        if new_active == self.active {
            return (frame, HoverUpdate::default());
        }

        let haptic = match &new_active {
            Some(id) => self.last_haptic.as_ref() != Some(id),
            None => false,
        };
        if haptic {
            self.last_haptic = new_active.clone();
        }
        if new_active.is_none() {
            self.last_haptic = None;
        }
        self.active = new_active;

        (frame, HoverUpdate::new(true, haptic))
    }

    /// Forgets the active target if it is no longer among `targets`.
    pub fn retain(&mut self, targets: &[ButtonTarget]) {
        if let Some(id) = &self.active
            && !targets.iter().any(|t| &t.id == id)
        {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.last_haptic = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<ButtonTarget> {
        [("star", -80.0), ("bookmark", 0.0), ("share", 80.0)]
            .into_iter()
            .map(|(id, x)| ButtonTarget {
                id: ActionId::from(id),
                center: Point::new(x, -100.0),
                angle: 0.0,
            })
            .collect()
    }

    fn tracker() -> HoverTracker {
        HoverTracker::new(&RadialConfig {
            button_radius: 20.0,
            ..Default::default()
        })
    }

    #[test]
    fn proximity_scale_bounds() {
        assert_eq!(proximity_scale(0.0, 40.0, 0.4), 1.4);
        assert_eq!(proximity_scale(40.0, 40.0, 0.4), 1.0);
        assert_eq!(proximity_scale(400.0, 40.0, 0.4), 1.0);
        assert!((proximity_scale(20.0, 40.0, 0.4) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn pointer_on_target_activates_it() {
        let mut t = tracker();
        let (frame, update) = t.update(&targets(), Point::new(0.0, -100.0));
        assert_eq!(frame.active, Some(1));
        assert_eq!(t.active(), Some(&ActionId::from("bookmark")));
        assert!(update.changed && update.haptic);
        assert_eq!(frame.scales[1], 1.4);
    }

    #[test]
    fn just_outside_threshold_is_dead_space() {
        let mut t = tracker();
        // 1.5 x button radius below bookmark
        let (frame, _) = t.update(&targets(), Point::new(0.0, -100.0 + 30.0));
        assert_eq!(frame.nearest.map(|(i, _)| i), Some(1));
        assert_eq!(frame.active, None);
        assert_eq!(t.active(), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        let t = tracker();
        let frame = t.score(&targets(), Point::new(0.0, -100.0 + 28.0));
        assert_eq!(frame.active, Some(1));
    }

    #[test]
    fn at_most_one_target_is_active() {
        let t = tracker();
        for xi in -20..=20 {
            for yi in -20..=5 {
                let frame = t.score(&targets(), Point::new(xi as f64 * 6.0, yi as f64 * 6.0));
                if let Some(i) = frame.active {
                    let (ni, _) = frame.nearest.unwrap();
                    assert_eq!(i, ni);
                }
            }
        }
    }

    #[test]
    fn haptic_fires_once_per_dwell() {
        let mut t = tracker();
        let targets = targets();
        let mut pulses = 0;
        let path = [
            Point::new(0.0, 0.0),
            Point::new(0.0, -95.0),
            Point::new(2.0, -100.0),
            Point::new(-3.0, -101.0),
            Point::new(80.0, -100.0),
            Point::new(0.0, -100.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, -100.0),
        ];
        for p in path {
            if t.update(&targets, p).1.haptic {
                pulses += 1;
            }
        }
        // bookmark, share, bookmark, bookmark again after leaving
        assert_eq!(pulses, 4);
    }

    #[test]
    fn retain_drops_stale_active() {
        let mut t = tracker();
        t.update(&targets(), Point::new(80.0, -100.0));
        assert!(t.active().is_some());
        let remaining: Vec<_> = targets().into_iter().take(2).collect();
        t.retain(&remaining);
        assert_eq!(t.active(), None);
    }
}
