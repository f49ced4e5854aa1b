//! Frame and menu painting with core X drawing, plus the cursor set.

use strum::IntoEnumIterator;
use tracing::warn;
use x11rb::connection::Connection;
use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::{
    ChangeGCAux, ConnectionExt as _, CreateGCAux, Cursor, Font, Gcontext, Rectangle, Screen,
    Window,
};
use x11rb::rust_connection::RustConnection;

use super::X11Error;
use crate::common::collections::HashMap;
use crate::common::config::DecorationSettings;
use crate::model::CursorShape;
use crate::sys::window_server::FrameStyle;

const TEXT_PAD: i32 = 4;

pub struct Painter {
    gc: Gcontext,
    ascent: i32,
    descent: i32,
    focused: u32,
    unfocused: u32,
    text: u32,
    menu_background: u32,
}

impl Painter {
    pub fn new(
        conn: &RustConnection,
        screen: &Screen,
        settings: &DecorationSettings,
    ) -> Result<Painter, X11Error> {
        let font = open_font(conn, &settings.font)?;
        let metrics = conn.query_font(font)?.reply()?;
        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            screen.root,
            &CreateGCAux::new()
                .font(font)
                .foreground(screen.white_pixel)
                .background(screen.black_pixel)
                .graphics_exposures(0),
        )?;
        Ok(Painter {
            gc,
            ascent: i32::from(metrics.font_ascent),
            descent: i32::from(metrics.font_descent),
            focused: settings.focused_pixel(),
            unfocused: settings.unfocused_pixel(),
            text: screen.white_pixel,
            menu_background: screen.black_pixel,
        })
    }

    pub fn draw_frame(
        &self,
        conn: &RustConnection,
        frame: Window,
        style: &FrameStyle,
    ) -> Result<(), ConnectionError> {
        let fill = if style.focused { self.focused } else { self.unfocused };
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(fill))?;
        conn.poly_fill_rectangle(frame, self.gc, &[rect(0, 0, style.width, style.height)])?;
        if style.title_height <= 0 {
            return Ok(());
        }

        let (b, t) = (style.border, style.title_height);
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(self.text).background(fill))?;
        // Close box.
        let inset = (t / 4).max(2);
        let side = t - 2 * inset;
        conn.poly_rectangle(frame, self.gc, &[rect(b + inset, b + inset, side, side)])?;

        let x = clamp16(b + t + TEXT_PAD);
        let baseline = clamp16(b + (t + self.ascent - self.descent) / 2);
        conn.image_text8(frame, self.gc, x, baseline, text8(&style.title))?;
        Ok(())
    }

    pub fn draw_menu(
        &self,
        conn: &RustConnection,
        menu: Window,
        width: i32,
        row_height: i32,
        entries: &[String],
    ) -> Result<(), ConnectionError> {
        let height = row_height * entries.len() as i32;
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(self.menu_background))?;
        conn.poly_fill_rectangle(menu, self.gc, &[rect(0, 0, width, height)])?;
        conn.change_gc(
            self.gc,
            &ChangeGCAux::new().foreground(self.text).background(self.menu_background),
        )?;
        for (i, entry) in entries.iter().enumerate() {
            let top = row_height * i as i32;
            let baseline = top + (row_height + self.ascent - self.descent) / 2;
            conn.image_text8(menu, self.gc, clamp16(TEXT_PAD), clamp16(baseline), text8(entry))?;
        }
        Ok(())
    }
}

fn open_font(conn: &RustConnection, name: &str) -> Result<Font, X11Error> {
    let font = conn.generate_id()?;
    if conn.open_font(font, name.as_bytes())?.check().is_ok() {
        return Ok(font);
    }
    warn!(font = name, "font not available, falling back to \"fixed\"");
    let fallback = conn.generate_id()?;
    conn.open_font(fallback, b"fixed")?.check()?;
    Ok(fallback)
}

/// Glyph-font cursors for every pointer shape.
pub struct Cursors {
    cursors: HashMap<CursorShape, Cursor>,
}

impl Cursors {
    pub fn new(conn: &RustConnection) -> Result<Cursors, X11Error> {
        let font = conn.generate_id()?;
        conn.open_font(font, b"cursor")?.check()?;
        let mut cursors = HashMap::default();
        for shape in CursorShape::iter() {
            let glyph = glyph(shape);
            let cursor = conn.generate_id()?;
            conn.create_glyph_cursor(
                cursor,
                font,
                font,
                glyph,
                glyph + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )?;
            cursors.insert(shape, cursor);
        }
        conn.close_font(font)?;
        Ok(Cursors { cursors })
    }

    pub fn get(&self, shape: CursorShape) -> Cursor {
        self.cursors.get(&shape).copied().unwrap_or(x11rb::NONE)
    }
}

/// Index into the standard cursor font.
fn glyph(shape: CursorShape) -> u16 {
    match shape {
        CursorShape::Arrow => 68,
        CursorShape::Move => 52,
        CursorShape::Close => 88,
        CursorShape::TopLeftCorner => 134,
        CursorShape::TopSide => 138,
        CursorShape::TopRightCorner => 136,
        CursorShape::RightSide => 96,
        CursorShape::BottomRightCorner => 14,
        CursorShape::BottomSide => 16,
        CursorShape::BottomLeftCorner => 12,
        CursorShape::LeftSide => 70,
    }
}

fn rect(x: i32, y: i32, width: i32, height: i32) -> Rectangle {
    Rectangle {
        x: clamp16(x),
        y: clamp16(y),
        width: clamp_u16(width),
        height: clamp_u16(height),
    }
}

pub fn clamp16(v: i32) -> i16 { v.clamp(i16::MIN as i32, i16::MAX as i32) as i16 }

pub fn clamp_u16(v: i32) -> u16 { v.clamp(1, u16::MAX as i32) as u16 }

/// Core text requests carry at most 255 bytes.
fn text8(s: &str) -> &[u8] {
    let mut end = s.len().min(255);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}
