//! [`WindowSystem`] and [`EventSource`] implementation backed by an X11
//! connection.
//!
//! The manager only listens for substructure notifications on the root
//! window; it never redirects map requests, so clients map themselves and
//! are picked up from their create notification.

use crate::traits::{EventSource, WindowSystem};
use crate::types::{
    Event, EventMask, GcId, Geometry, MapState, WindowAttributes, WindowClass, WindowId,
};
use log::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    self, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ConfigureWindowAux,
    ConnectionExt as _, CreateGCAux, CreateWindowAux, GrabMode, GrabStatus, InputFocus, ModMask,
    StackMode,
};
use x11rb::protocol::Event as XEvent;
use x11rb::rust_connection::RustConnection;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

/// Core font used for icon labels.
const LABEL_FONT: &[u8] = b"fixed";

/// `PointerRoot` as reported by `GetInputFocus`.
const POINTER_ROOT: u32 = 1;

/// Longest string a single `ImageText8` request can carry.
const MAX_TEXT8_LEN: usize = 255;

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    #[error("cannot connect to X server: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),
    #[error("X11 request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),
    #[error("pointer grab refused (status {0})")]
    GrabRefused(u8),
}

/// X11-backed windowing system.
///
/// Requests are buffered by the connection and flushed whenever a query
/// needs a reply or the event loop waits for the next event.
pub struct X11Backend {
    conn: RustConnection,
    screen_num: usize,
    font: Option<xproto::Font>,
}

impl X11Backend {
    /// Connect to `display` (or `$DISPLAY` when `None`) and subscribe to
    /// create/destroy notifications on the root window.
    pub fn connect(display: Option<&str>) -> Result<Self, X11Error> {
        let (conn, screen_num) = x11rb::connect(display)?;

        let font_id = conn.generate_id()?;
        let font = match conn.open_font(font_id, LABEL_FONT)?.check() {
            Ok(()) => Some(font_id),
            Err(e) => {
                warn!("cannot open font 'fixed' ({}), using server default", e);
                None
            }
        };

        let backend = Self {
            conn,
            screen_num,
            font,
        };
        let root = backend.root();
        backend
            .conn
            .change_window_attributes(
                root,
                &ChangeWindowAttributesAux::new()
                    .event_mask(xproto::EventMask::SUBSTRUCTURE_NOTIFY),
            )?
            .check()?;
        backend.conn.flush()?;

        let (width, height) = backend.screen_size()?;
        info!("connected to X screen {} ({}x{})", screen_num, width, height);
        Ok(backend)
    }

    fn screen(&self) -> &xproto::Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    fn root(&self) -> xproto::Window {
        self.screen().root
    }

    /// Top-level windows that were already mapped when the manager started.
    pub fn existing_windows(&self) -> Result<Vec<WindowId>, X11Error> {
        let tree = self.conn.query_tree(self.root())?.reply()?;
        let mut windows = Vec::new();
        for child in tree.children {
            let attrs = self.conn.get_window_attributes(child)?.reply()?;
            if !attrs.override_redirect && attrs.map_state == xproto::MapState::VIEWABLE {
                windows.push(WindowId(child));
            }
        }
        Ok(windows)
    }

    fn translate(&self, event: XEvent) -> Option<Event> {
        match event {
            XEvent::CreateNotify(e) if !e.override_redirect => {
                Some(Event::WindowCreated(WindowId(e.window)))
            }
            XEvent::DestroyNotify(e) => Some(Event::WindowDestroyed(WindowId(e.window))),
            XEvent::ButtonPress(e) => Some(Event::ButtonPress {
                window: WindowId(e.event),
            }),
            XEvent::ButtonRelease(e) => Some(Event::ButtonRelease {
                window: WindowId(e.event),
            }),
            XEvent::Expose(e) => Some(Event::Expose {
                window: WindowId(e.window),
                count: e.count,
            }),
            XEvent::MotionNotify(e) => Some(Event::Motion {
                window: WindowId(e.event),
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            XEvent::Error(e) => {
                warn!(
                    "X11 error {} on request {} (resource 0x{:x})",
                    e.error_code, e.major_opcode, e.bad_value
                );
                None
            }
            _ => None,
        }
    }
}

//  Conversions

fn x_event_mask(mask: EventMask) -> xproto::EventMask {
    let mut m = xproto::EventMask::NO_EVENT;
    if mask.contains(EventMask::BUTTON_PRESS) {
        m = m | xproto::EventMask::BUTTON_PRESS;
    }
    if mask.contains(EventMask::BUTTON_RELEASE) {
        m = m | xproto::EventMask::BUTTON_RELEASE;
    }
    if mask.contains(EventMask::EXPOSURE) {
        m = m | xproto::EventMask::EXPOSURE;
    }
    if mask.contains(EventMask::POINTER_MOTION) {
        m = m | xproto::EventMask::POINTER_MOTION;
    }
    m
}

/// X11 sizes are 16 bit and must be non-zero.
fn x_size(v: u32) -> u16 {
    v.clamp(1, u32::from(u16::MAX)) as u16
}

fn x_coord(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Attributes of the manager's own surfaces.  They are override-redirect
/// from creation so their create notifications are filtered out.
fn surface_aux(background: u32, border: u32) -> CreateWindowAux {
    CreateWindowAux::new()
        .background_pixel(background)
        .border_pixel(border)
        .override_redirect(1)
}

/// Decode a `WM_NAME` value.  `STRING` properties are Latin-1; anything
/// else (`UTF8_STRING`, `COMPOUND_TEXT`) is treated as UTF-8.
fn decode_title(value: &[u8], is_latin1: bool) -> String {
    if is_latin1 {
        value.iter().map(|&b| char::from(b)).collect()
    } else {
        String::from_utf8_lossy(value).into_owned()
    }
}

/// Encode `text` for an 8-bit core font: Latin-1, anything else as `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(MAX_TEXT8_LEN)
        .collect()
}

//  WindowSystem implementation

impl WindowSystem for X11Backend {
    type Error = X11Error;

    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, Self::Error> {
        let attrs = self.conn.get_window_attributes(window.0)?.reply()?;
        let geom = self.conn.get_geometry(window.0)?.reply()?;

        let class = if attrs.class == xproto::WindowClass::INPUT_ONLY {
            WindowClass::InputOnly
        } else {
            WindowClass::InputOutput
        };
        let map_state = if attrs.map_state == xproto::MapState::VIEWABLE {
            MapState::Viewable
        } else if attrs.map_state == xproto::MapState::UNVIEWABLE {
            MapState::Unviewable
        } else {
            MapState::Unmapped
        };

        Ok(WindowAttributes {
            geometry: Geometry::new(
                i32::from(geom.x),
                i32::from(geom.y),
                u32::from(geom.width),
                u32::from(geom.height),
            ),
            class,
            map_state,
            override_redirect: attrs.override_redirect,
        })
    }

    fn set_border_width(&self, window: WindowId, width: u32) -> Result<(), Self::Error> {
        self.conn
            .configure_window(window.0, &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn create_surface(&self, geometry: Geometry) -> Result<WindowId, Self::Error> {
        let screen = self.screen();
        let id = self.conn.generate_id()?;
        let aux = surface_aux(screen.white_pixel, screen.black_pixel);
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            id,
            screen.root,
            x_coord(geometry.x),
            x_coord(geometry.y),
            x_size(geometry.width),
            x_size(geometry.height),
            1,
            xproto::WindowClass::INPUT_OUTPUT,
            COPY_FROM_PARENT,
            &aux,
        )?;
        debug!("created surface 0x{:x} at {}", id, geometry);
        Ok(WindowId(id))
    }

    fn set_override_redirect(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.change_window_attributes(
            window.0,
            &ChangeWindowAttributesAux::new().override_redirect(1),
        )?;
        Ok(())
    }

    fn select_input(&self, window: WindowId, mask: EventMask) -> Result<(), Self::Error> {
        self.conn.change_window_attributes(
            window.0,
            &ChangeWindowAttributesAux::new().event_mask(x_event_mask(mask)),
        )?;
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.destroy_window(window.0)?;
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.map_window(window.0)?;
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.unmap_window(window.0)?;
        Ok(())
    }

    fn raise_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.configure_window(
            window.0,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        Ok(())
    }

    fn lower_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.configure_window(
            window.0,
            &ConfigureWindowAux::new().stack_mode(StackMode::BELOW),
        )?;
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), Self::Error> {
        self.conn
            .configure_window(window.0, &ConfigureWindowAux::new().x(x).y(y))?;
        Ok(())
    }

    fn move_resize_window(&self, window: WindowId, geometry: Geometry) -> Result<(), Self::Error> {
        let aux = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(u32::from(x_size(geometry.width)))
            .height(u32::from(x_size(geometry.height)));
        self.conn.configure_window(window.0, &aux)?;
        Ok(())
    }

    fn create_gc(&self, window: WindowId) -> Result<GcId, Self::Error> {
        let screen = self.screen();
        let gc = self.conn.generate_id()?;
        let mut aux = CreateGCAux::new()
            .foreground(screen.black_pixel)
            .background(screen.white_pixel);
        if let Some(font) = self.font {
            aux = aux.font(font);
        }
        self.conn.create_gc(gc, window.0, &aux)?;
        Ok(GcId(gc))
    }

    fn free_gc(&self, gc: GcId) -> Result<(), Self::Error> {
        self.conn.free_gc(gc.0)?;
        Ok(())
    }

    fn clear_window(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.clear_area(false, window.0, 0, 0, 0, 0)?;
        Ok(())
    }

    fn draw_text(
        &self,
        window: WindowId,
        gc: GcId,
        x: i32,
        y: i32,
        text: &str,
    ) -> Result<(), Self::Error> {
        self.conn
            .image_text8(window.0, gc.0, x_coord(x), x_coord(y), &latin1(text))?;
        Ok(())
    }

    fn fetch_name(&self, window: WindowId) -> Result<Option<String>, Self::Error> {
        let reply = self
            .conn
            .get_property(false, window.0, AtomEnum::WM_NAME, AtomEnum::ANY, 0, 1024)?
            .reply()?;
        if reply.value.is_empty() {
            return Ok(None);
        }
        let is_latin1 = reply.type_ == u32::from(AtomEnum::STRING);
        Ok(Some(decode_title(&reply.value, is_latin1)))
    }

    fn grab_button(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn.grab_button(
            false,
            window.0,
            xproto::EventMask::BUTTON_PRESS | xproto::EventMask::BUTTON_RELEASE,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            NONE,
            NONE,
            ButtonIndex::ANY,
            ModMask::ANY,
        )?;
        Ok(())
    }

    fn ungrab_button(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, window.0, ModMask::ANY)?;
        Ok(())
    }

    fn grab_pointer(&self, window: WindowId, mask: EventMask) -> Result<(), Self::Error> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                window.0,
                x_event_mask(mask),
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                CURRENT_TIME,
            )?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            return Err(X11Error::GrabRefused(u8::from(reply.status)));
        }
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<(), Self::Error> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn set_input_focus(&self, window: WindowId) -> Result<(), Self::Error> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window.0, CURRENT_TIME)?;
        Ok(())
    }

    fn input_focus(&self) -> Result<Option<WindowId>, Self::Error> {
        let reply = self.conn.get_input_focus()?.reply()?;
        if reply.focus == NONE || reply.focus == POINTER_ROOT {
            return Ok(None);
        }
        Ok(Some(WindowId(reply.focus)))
    }

    fn screen_size(&self) -> Result<(u32, u32), Self::Error> {
        let screen = self.screen();
        Ok((
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        ))
    }
}

//  EventSource implementation

impl EventSource for X11Backend {
    type Error = X11Error;

    /// Flush pending requests and block until an event the core cares
    /// about arrives.  Never returns `Ok(None)`: the stream only ends with
    /// the connection.
    fn next_event(&self) -> Result<Option<Event>, Self::Error> {
        loop {
            self.conn.flush()?;
            let event = self.conn.wait_for_event()?;
            if let Some(event) = self.translate(event) {
                return Ok(Some(event));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_masks_translate_bit_for_bit() {
        let m = x_event_mask(EventMask::POINTER_MOTION | EventMask::BUTTON_RELEASE);
        assert_eq!(
            u32::from(m),
            u32::from(xproto::EventMask::POINTER_MOTION | xproto::EventMask::BUTTON_RELEASE)
        );
        assert_eq!(u32::from(x_event_mask(EventMask::NONE)), 0);
    }

    #[test]
    fn sizes_are_clamped_to_protocol_range() {
        assert_eq!(x_size(0), 1);
        assert_eq!(x_size(640), 640);
        assert_eq!(x_size(1 << 20), u16::MAX);
        assert_eq!(x_coord(-200), -200);
        assert_eq!(x_coord(100_000), i16::MAX);
    }

    #[test]
    fn surfaces_are_override_redirect_from_creation() {
        let aux = surface_aux(0xffffff, 0);
        assert_eq!(aux.override_redirect, Some(1));
        assert_eq!(aux.background_pixel, Some(0xffffff));
        assert_eq!(aux.border_pixel, Some(0));
    }

    #[test]
    fn string_titles_decode_as_latin1() {
        assert_eq!(decode_title(b"caf\xe9", true), "café");
        assert_eq!(decode_title("café".as_bytes(), false), "café");
        assert_eq!(decode_title(b"caf\xe9", false), "caf\u{fffd}");
    }

    #[test]
    fn labels_are_encoded_as_latin1() {
        assert_eq!(latin1("café"), b"caf\xe9".to_vec());
        assert_eq!(latin1("日本"), b"??".to_vec());
        assert_eq!(latin1(&"x".repeat(300)).len(), MAX_TEXT8_LEN);
    }
}
