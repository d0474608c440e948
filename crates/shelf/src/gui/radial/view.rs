use crate::gui::card::{COVER_HEIGHT, CardData, CardVisual};
use crate::gui::theme::{ThemeColors, tint_color, tint_shade};
use cairo::{Context, LinearGradient};
use fanout::gesture::RadialOverlay;
use fanout::menu::ButtonVisual;
use fanout::overlay::{MAX_BLUR, OverlayFrame};
use fanout::{Icon, Rect};
use gdk_pixbuf::Pixbuf;
use gdk4::prelude::*;
use palette::Srgba;
use std::cell::RefCell;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

const CARD_CORNER: f64 = 12.0;
const MAX_SCRIM_ALPHA: f64 = 0.85;
const BLUR_DIM: f64 = 0.3; // extra dimming standing in for backdrop blur
const LABEL_GAP: f64 = 10.0;

/// Backdrop alpha for a frame: the scrim fades with the session and deepens
/// with the blur amount.
pub fn scrim_alpha(base: f64, frame: &OverlayFrame) -> f64 {
    let blur = (frame.blur / MAX_BLUR).clamp(0.0, 1.0);
    (base * frame.opacity * (1.0 + BLUR_DIM * blur)).clamp(0.0, MAX_SCRIM_ALPHA)
}

/// Scale and offset that make an image of `src` size cover `dst` while
/// staying centered.
pub fn cover_fit(src: (f64, f64), dst: (f64, f64)) -> (f64, f64, f64) {
    let (sw, sh) = (src.0.max(1.0), src.1.max(1.0));
    let scale = (dst.0 / sw).max(dst.1 / sh);
    (scale, (dst.0 - sw * scale) / 2.0, (dst.1 - sh * scale) / 2.0)
}

#[derive(Default)]
pub struct IconCache {
    icons: RefCell<HashMap<PathBuf, Option<Pixbuf>>>,
}

impl IconCache {
    fn get(&self, path: &Path, size: i32) -> Option<Pixbuf> {
        self.icons
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_insert_with(|| match Pixbuf::from_file_at_scale(path, size, size, true) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("Failed to load icon {}: {}", path.display(), e);
                    None
                }
            })
            .clone()
    }
}

fn set_color(cr: &Context, color: Srgba<f64>, alpha: f64) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a * alpha);
}

fn rounded_rect(cr: &Context, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    cr.new_sub_path();
    cr.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
    cr.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
    cr.arc(x + r, y + h - r, r, PI / 2.0, PI);
    cr.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
    cr.close_path();
}

fn centered_text(cr: &Context, text: &str, x: f64, y: f64) -> Result<(), cairo::Error> {
    let ext = cr.text_extents(text)?;
    cr.move_to(
        x - ext.width() / 2.0 - ext.x_bearing(),
        y - ext.height() / 2.0 - ext.y_bearing(),
    );
    cr.show_text(text)
}

/// Cover art, or a tinted placeholder with the title's initial.
pub fn paint_cover(cr: &Context, data: &CardData, w: f64, h: f64) -> Result<(), cairo::Error> {
    cr.save()?;
    cr.rectangle(0.0, 0.0, w, h);
    cr.clip();

    if let Some(pixbuf) = &data.cover {
        let (scale, dx, dy) = cover_fit((pixbuf.width() as f64, pixbuf.height() as f64), (w, h));
        cr.translate(dx, dy);
        cr.scale(scale, scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint()?;
    } else {
        let (top, bottom) = (tint_color(data.tint), tint_shade(data.tint));
        let gradient = LinearGradient::new(0.0, 0.0, 0.0, h);
        gradient.add_color_stop_rgb(0.0, top.red, top.green, top.blue);
        gradient.add_color_stop_rgb(1.0, bottom.red, bottom.green, bottom.blue);
        cr.set_source(&gradient)?;
        cr.paint()?;

        if let Some(initial) = data.title.chars().next() {
            cr.set_source_rgba(1.0, 1.0, 1.0, 0.9);
            cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
            cr.set_font_size(h * 0.4);
            centered_text(cr, &initial.to_uppercase().to_string(), w / 2.0, h / 2.0)?;
        }
    }
    cr.restore()
}

struct ButtonRenderer<'a> {
    button: &'a ButtonVisual<'a>,
    alpha: f64,
}

impl<'a> ButtonRenderer<'a> {
    fn draw(&self, cr: &Context, colors: &ThemeColors, icons: &IconCache) -> Result<(), cairo::Error> {
        let b = self.button;
        let radius = b.diameter / 2.0;
        if radius <= 0.0 {
            return Ok(());
        }

        let fill = if b.active {
            colors.button_active
        } else {
            colors.button
        };
        set_color(cr, fill, self.alpha);
        cr.arc(b.center.x, b.center.y, radius, 0.0, 2.0 * PI);
        cr.fill()?;

        match &b.action.icon {
            Icon::Symbol(symbol) => {
                set_color(cr, colors.glyph, self.alpha);
                cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
                cr.set_font_size(radius * 0.9);
                centered_text(cr, &symbol.glyph().to_string(), b.center.x, b.center.y)?;
            }
            Icon::File(path) => {
                let size = (radius * 1.2).round() as i32;
                if let Some(pixbuf) = icons.get(path, size.max(1)) {
                    cr.save()?;
                    cr.translate(
                        b.center.x - pixbuf.width() as f64 / 2.0,
                        b.center.y - pixbuf.height() as f64 / 2.0,
                    );
                    cr.set_source_pixbuf(&pixbuf, 0.0, 0.0);
                    cr.paint_with_alpha(self.alpha)?;
                    cr.restore()?;
                }
            }
        }

        if b.active {
            self.draw_label(cr, colors, radius)?;
        }
        Ok(())
    }

    fn draw_label(&self, cr: &Context, colors: &ThemeColors, radius: f64) -> Result<(), cairo::Error> {
        let b = self.button;
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(13.0);
        let ext = cr.text_extents(&b.action.title)?;
        let (w, h) = (ext.width() + 20.0, ext.height() + 12.0);
        let y = b.center.y - radius - LABEL_GAP - h;

        set_color(cr, colors.label, self.alpha);
        rounded_rect(cr, b.center.x - w / 2.0, y, w, h, h / 2.0);
        cr.fill()?;
        cr.set_source_rgba(1.0, 1.0, 1.0, self.alpha);
        centered_text(cr, &b.action.title, b.center.x, y + h / 2.0)
    }
}

fn draw_card(
    cr: &Context,
    visual: &CardVisual,
    bounds: &Rect,
    frame: &OverlayFrame,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let center = bounds.center();
    let cover_h = (COVER_HEIGHT as f64).min(bounds.height * 0.75);

    cr.save()?;
    cr.translate(center.x, center.y);
    cr.rotate(frame.content_rotation.to_radians());
    cr.scale(frame.content_scale, frame.content_scale);
    cr.translate(-bounds.width / 2.0, -bounds.height / 2.0);

    cr.push_group();
    rounded_rect(cr, 0.0, 0.0, bounds.width, bounds.height, CARD_CORNER);
    cr.clip();
    set_color(cr, colors.card, 1.0);
    cr.paint()?;
    paint_cover(cr, visual, bounds.width, cover_h)?;

    set_color(cr, colors.card_text, 1.0);
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size(13.0);
    cr.move_to(10.0, cover_h + 20.0);
    cr.show_text(&visual.title)?;
    cr.pop_group_to_source()?;
    cr.paint_with_alpha(frame.opacity)?;

    cr.restore()
}

/// Draws one overlay frame: scrim, lifted card, then the menu buttons.
pub fn draw(
    cr: &Context,
    overlay: Option<&RadialOverlay<CardVisual>>,
    frame: &OverlayFrame,
    size: (f64, f64),
    colors: &ThemeColors,
    icons: &IconCache,
) -> Result<(), cairo::Error> {
    let (r, g, b, a) = colors.scrim.into_components();
    cr.set_source_rgba(r, g, b, scrim_alpha(a, frame));
    cr.rectangle(0.0, 0.0, size.0, size.1);
    cr.fill()?;

    let Some(overlay) = overlay else {
        return Ok(());
    };
    draw_card(cr, &overlay.visual, &overlay.bounds, frame, colors)?;

    for button in overlay.menu.buttons() {
        ButtonRenderer {
            button: &button,
            alpha: button.opacity * frame.opacity,
        }
        .draw(cr, colors, icons)?;
    }
    Ok(())
}
