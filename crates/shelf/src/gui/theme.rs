use crate::config::Tint;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::{Darken, Hsl, IntoColor, Srgb, Srgba};

pub struct ThemeColors {
    pub scrim: Srgba<f64>,
    pub button: Srgba<f64>,
    pub button_active: Srgba<f64>,
    pub glyph: Srgba<f64>,
    pub card: Srgba<f64>,
    pub card_text: Srgba<f64>,
    pub label: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            scrim: Srgba::new(0.0, 0.0, 0.0, 0.45),
            button: Self::lookup_color(
                context,
                "theme_bg_color",
                Srgba::new(0.95, 0.95, 0.95, 0.95),
                Some(0.95),
            ),
            button_active: Self::lookup_color(
                context,
                "theme_selected_bg_color",
                Srgba::new(0.21, 0.52, 0.89, 1.0),
                Some(1.0),
            ),
            glyph: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(0.1, 0.1, 0.1, 1.0),
                None,
            ),
            card: Self::lookup_color(
                context,
                "theme_base_color",
                Srgba::new(1.0, 1.0, 1.0, 1.0),
                Some(1.0),
            ),
            card_text: Self::lookup_color(
                context,
                "theme_text_color",
                Srgba::new(0.1, 0.1, 0.1, 1.0),
                None,
            ),
            label: Srgba::new(0.1, 0.1, 0.1, 0.85),
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                let (r, g, b, a) = (
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                );
                Srgba::new(r, g, b, alpha_override.unwrap_or(a))
            })
            .unwrap_or(fallback)
    }
}

pub fn tint_color(tint: Tint) -> Srgb<f64> {
    match tint {
        Tint::Slate => Srgb::new(0.44, 0.50, 0.56),
        Tint::Sand => Srgb::new(0.87, 0.76, 0.53),
        Tint::Moss => Srgb::new(0.46, 0.58, 0.38),
        Tint::Rust => Srgb::new(0.72, 0.33, 0.22),
        Tint::Sky => Srgb::new(0.45, 0.66, 0.86),
    }
}

/// Lower edge of the placeholder gradient.
pub fn tint_shade(tint: Tint) -> Srgb<f64> {
    let hsl: Hsl<palette::encoding::Srgb, f64> = tint_color(tint).into_color();
    hsl.darken(0.25).into_color()
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.shelf-scrim {
    background: none;
    background-color: transparent;
}
.shelf-card {
    border-radius: 12px;
    padding: 0;
}
.shelf-card-cover {
    border-radius: 12px 12px 0 0;
}
.shelf-card-title {
    font-weight: bold;
    margin: 6px 10px 0 10px;
}
.shelf-card-subtitle {
    opacity: 0.7;
    margin: 0 10px 8px 10px;
}
.shelf-toast {
    background-color: alpha(black, 0.85);
    color: white;
    border-radius: 18px;
    padding: 6px 14px;
    margin: 16px;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
