//! Where the radial buttons go.
//!
//! Angles are resolved in a "user" convention (0° = up, growing
//! counter-clockwise) and converted to the render convention (0° = right,
//! growing clockwise on a y-down screen) before the polar-to-Cartesian step.
//! Targets are not clamped to the viewport; a press close to an edge may
//! place a button partly off-screen.

use crate::action::{ActionId, ActionSpec};
use crate::config::{FarAngles, RadialConfig};
use crate::geom::{Point, Size};
use serde::Serialize;

pub const UP: f64 = 0.0;
pub const DOWN: f64 = 180.0;

/// Signed shortest rotation from `from` to `to`, in degrees within [-180, 180).
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap-aware interpolation between two angles.
pub fn lerp_angle(from: f64, to: f64, t: f64) -> f64 {
    (from + shortest_delta(from, to) * t).rem_euclid(360.0)
}

/// Converts "0° = up, counter-clockwise" into "0° = right, clockwise".
///
/// A user angle `u` names the unit vector `(-sin u, -cos u)` on a y-down
/// screen. The render angle `r` with `(cos r, sin r)` equal to that vector is
/// `r = 270° - u`.
pub fn user_to_render_angle(user: f64) -> f64 {
    (270.0 - user).rem_euclid(360.0)
}

/// Screen region a press falls into, as far as the base angle cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressRegion {
    pub top: bool,
    pub centered: bool,
    pub right: bool,
}

impl PressRegion {
    pub fn classify(press: Point, viewport: Size, cfg: &RadialConfig) -> Self {
        let half = viewport.width / 2.0;
        let dx = press.x - half;
        Self {
            top: press.y < viewport.height * cfg.top_band_ratio,
            centered: dx.abs() <= cfg.center_band_ratio * half,
            right: dx > 0.0,
        }
    }

    pub fn centered_angle(&self) -> f64 {
        if self.top { DOWN } else { UP }
    }

    pub fn far_angle(&self, far: &FarAngles) -> f64 {
        match (self.top, self.right) {
            (true, true) => far.top_right,
            (true, false) => far.top_left,
            (false, true) => far.bottom_right,
            (false, false) => far.bottom_left,
        }
    }
}

/// Direction the menu fans out toward, in the user convention.
///
/// Inside the center band the centered direction is used exactly. Outside
/// it the angle moves toward the side's far angle, with the interpolation
/// factor starting at 0 on the band edge and reaching 1 at the screen edge so
/// the angle has no jump when a press crosses the band boundary.
pub fn resolve_base_angle(press: Point, viewport: Size, cfg: &RadialConfig) -> f64 {
    let region = PressRegion::classify(press, viewport, cfg);
    let centered = region.centered_angle();
    let half = viewport.width / 2.0;
    if region.centered || half <= 0.0 {
        return centered;
    }

    let band = cfg.center_band_ratio * half;
    let span = (half - band).max(f64::EPSILON);
    let t = (((press.x - half).abs() - band) / span).clamp(0.0, 1.0);
    lerp_angle(centered, region.far_angle(&cfg.far_angles), t)
}

/// User-convention angles for `count` slots spaced around `base`, ordered
/// left-to-right as seen when the menu fans upward.
pub fn slot_angles(base: f64, count: usize, spacing: f64) -> Vec<f64> {
    let mid = (count as f64 - 1.0) / 2.0;
    (0..count)
        .map(|i| (base + (mid - i as f64) * spacing).rem_euclid(360.0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonTarget {
    pub id: ActionId,
    pub center: Point,
    /// Render-convention angle of this button around the press point.
    pub angle: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialLayout {
    pub origin: Point,
    pub viewport: Size,
    pub base_angle: f64,
    pub targets: Vec<ButtonTarget>,
}

impl RadialLayout {
    pub fn resolve(
        origin: Point,
        viewport: Size,
        actions: &[ActionSpec],
        cfg: &RadialConfig,
    ) -> Self {
        let base_angle = resolve_base_angle(origin, viewport, cfg);
        let targets = slot_angles(base_angle, actions.len(), cfg.angle_spacing)
            .into_iter()
            .zip(actions)
            .map(|(user, action)| {
                let angle = user_to_render_angle(user);
                ButtonTarget {
                    id: action.id.clone(),
                    center: origin.polar(cfg.menu_radius, angle),
                    angle,
                }
            })
            .collect();

        Self {
            origin,
            viewport,
            base_angle,
            targets,
        }
    }

    pub fn target(&self, id: &ActionId) -> Option<&ButtonTarget> {
        self.targets.iter().find(|t| &t.id == id)
    }

    /// Targets whose button circle is not fully inside the viewport.
    pub fn clipped_targets(&self, button_radius: f64) -> impl Iterator<Item = &ButtonTarget> {
        let Size { width, height } = self.viewport;
        self.targets.iter().filter(move |t| {
            t.center.x - button_radius < 0.0
                || t.center.y - button_radius < 0.0
                || t.center.x + button_radius > width
                || t.center.y + button_radius > height
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Symbol;

    const VIEWPORT: Size = Size {
        width: 400.0,
        height: 800.0,
    };

    fn actions() -> Vec<ActionSpec> {
        [Symbol::Star, Symbol::Bookmark, Symbol::Share]
            .into_iter()
            .map(ActionSpec::from_symbol)
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn render_conversion_matches_screen_directions() {
        let o = Point::default();
        let up = o.polar(1.0, user_to_render_angle(UP));
        let left = o.polar(1.0, user_to_render_angle(90.0));
        let down = o.polar(1.0, user_to_render_angle(DOWN));
        let right = o.polar(1.0, user_to_render_angle(270.0));

        assert!(approx(up.x, 0.0) && approx(up.y, -1.0));
        assert!(approx(left.x, -1.0) && approx(left.y, 0.0));
        assert!(approx(down.x, 0.0) && approx(down.y, 1.0));
        assert!(approx(right.x, 1.0) && approx(right.y, 0.0));
    }

    #[test]
    fn render_conversion_agrees_with_vector_definition() {
        for step in 0..72 {
            let user = step as f64 * 5.0;
            let p = Point::default().polar(1.0, user_to_render_angle(user));
            let rad = user.to_radians();
            assert!(approx(p.x, -rad.sin()), "x at {user}");
            assert!(approx(p.y, -rad.cos()), "y at {user}");
        }
    }

    #[test]
    fn shortest_delta_wraps() {
        assert!(approx(shortest_delta(350.0, 10.0), 20.0));
        assert!(approx(shortest_delta(10.0, 350.0), -20.0));
        assert!(approx(lerp_angle(0.0, 300.0, 0.5), 330.0));
    }

    #[test]
    fn every_target_sits_on_the_menu_radius() {
        let cfg = RadialConfig::default();
        for xi in 0..=10 {
            for yi in 0..=10 {
                let press = Point::new(xi as f64 * 40.0, yi as f64 * 80.0);
                let layout = RadialLayout::resolve(press, VIEWPORT, &actions(), &cfg);
                assert_eq!(layout.targets.len(), 3);
                for t in &layout.targets {
                    assert!(approx(t.center.distance(press), cfg.menu_radius));
                }
            }
        }
    }

    #[test]
    fn center_band_uses_centered_angle_exactly() {
        let cfg = RadialConfig::default();
        let band = cfg.center_band_ratio * VIEWPORT.width / 2.0;
        for dx in [-band, -band / 2.0, 0.0, band / 3.0, band] {
            let x = VIEWPORT.width / 2.0 + dx;
            for y in [10.0, 150.0, 199.0] {
                assert_eq!(resolve_base_angle(Point::new(x, y), VIEWPORT, &cfg), DOWN);
            }
            for y in [200.0, 500.0, 790.0] {
                assert_eq!(resolve_base_angle(Point::new(x, y), VIEWPORT, &cfg), UP);
            }
        }
    }

    #[test]
    fn top_center_press_fans_down() {
        let cfg = RadialConfig::default();
        let angle = resolve_base_angle(Point::new(200.0, 100.0), VIEWPORT, &cfg);
        assert_eq!(angle, DOWN);
        let layout = RadialLayout::resolve(Point::new(200.0, 100.0), VIEWPORT, &actions(), &cfg);
        assert!(layout.targets.iter().all(|t| t.center.y > 100.0 - 1e-9));
    }

    #[test]
    fn bottom_right_corner_reaches_far_angle() {
        let cfg = RadialConfig::default();
        let angle = resolve_base_angle(Point::new(400.0, 800.0), VIEWPORT, &cfg);
        assert!(approx(angle, cfg.far_angles.bottom_right));
        assert!(!approx(angle, UP));
    }

    #[test]
    fn base_angle_is_continuous_and_monotonic_away_from_center() {
        let cfg = RadialConfig::default();
        for (y, far, sign) in [
            (600.0, cfg.far_angles.bottom_right, 1.0),
            (50.0, cfg.far_angles.top_right, 1.0),
            (600.0, cfg.far_angles.bottom_left, -1.0),
            (50.0, cfg.far_angles.top_left, -1.0),
        ] {
            let region_center = if y < 200.0 { DOWN } else { UP };
            let total = shortest_delta(region_center, far);
            let mut prev = 0.0_f64;
            for step in 0..=200 {
                let x = 200.0 + sign * step as f64;
                let angle = resolve_base_angle(Point::new(x, y), VIEWPORT, &cfg);
                let progress = shortest_delta(region_center, angle) / total;
                assert!(progress >= prev - 1e-9, "not monotonic at x={x}");
                assert!(progress - prev < 0.02, "jump at x={x}");
                prev = progress;
            }
            assert!(approx(prev, 1.0));
        }
    }

    #[test]
    fn slots_run_left_to_right_when_fanning_up() {
        let cfg = RadialConfig::default();
        let layout = RadialLayout::resolve(Point::new(200.0, 600.0), VIEWPORT, &actions(), &cfg);
        let xs: Vec<f64> = layout.targets.iter().map(|t| t.center.x).collect();
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);
        assert!(approx(layout.targets[1].center.x, 200.0));
        assert!(approx(layout.targets[1].center.y, 600.0 - cfg.menu_radius));
    }

    #[test]
    fn edge_press_reports_clipped_targets_without_moving_them() {
        let cfg = RadialConfig::default();
        let press = Point::new(5.0, 790.0);
        let layout = RadialLayout::resolve(press, VIEWPORT, &actions(), &cfg);
        assert!(layout.clipped_targets(cfg.button_radius).count() > 0);
        for t in &layout.targets {
            assert!(approx(t.center.distance(press), cfg.menu_radius));
        }
    }
}
