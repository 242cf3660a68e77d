//! The client core that ties the registry, the per-client state machine and
//! the windowing system together.
//!
//! [`ClientManager`] owns the [`Registry`] and a [`WindowSystem`] backend.
//! Every operation runs to completion before returning, so a caller never
//! observes a half-applied transition.
//!
//! # State machine
//!
//! ```text
//!             hide                      begin_move_resize
//!   Hidden <-------- Visible (initial) -------------------> MoveResize
//!          -------->                  <-------------------
//!         unhide / unhide_forced          end_move_resize
//! ```
//!
//! Every transition is a guarded no-op when the client is not in the
//! source state.  [`maximize`](ClientManager::maximize) only touches
//! geometry and works in any state.

use crate::client::{Client, ClientState, Icon, Placeholder, StateKind};
use crate::config::{Config, DecorationConfig, IconConfig};
use crate::registry::{ClientId, Registry};
use crate::traits::WindowSystem;
use crate::types::{Event, EventMask, GcId, Geometry, WindowId};
use log::{debug, info};

/// Where freshly created icon surfaces are placed until the next icon
/// refresh positions them.
pub const ICON_SPAWN_POSITION: (i32, i32) = (-200, -200);

/// Possible errors from the client core.
///
/// Rejected operations (wrong state, unmanageable window) and lost focus
/// races are *not* errors; only failures reported by the windowing system
/// are.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// The windowing system returned an error.
    #[error("window system error: {0}")]
    WindowSystem(String),
}

pub(crate) fn ws_err<E: std::error::Error>(e: E) -> ManagerError {
    ManagerError::WindowSystem(e.to_string())
}

/// Tracks every managed window and drives it through its state machine.
///
/// The manager is generic over any [`WindowSystem`] implementation, making
/// it independent of X11 or any other concrete backend.
///
/// # Typical usage
///
/// ```ignore
/// let mut wm = ClientManager::new(X11Backend::connect(None)?, &Config::default());
/// if let Some(id) = wm.create(window)? {
///     wm.hide(id)?;
/// }
/// ```
pub struct ClientManager<W: WindowSystem> {
    pub(crate) ws: W,
    pub(crate) registry: Registry,
    pub(crate) icons: IconConfig,
    decoration: DecorationConfig,
}

impl<W: WindowSystem> ClientManager<W> {
    /// Create a manager with an empty registry and nothing focused.
    pub fn new(ws: W, config: &Config) -> Self {
        Self {
            ws,
            registry: Registry::new(),
            icons: config.icons.clone(),
            decoration: config.decoration.clone(),
        }
    }

    /// Return a shared reference to the windowing backend.
    pub fn backend(&self) -> &W {
        &self.ws
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.registry.get(id)
    }

    /// The currently focused client, always a visible one.
    pub fn focused(&self) -> Option<ClientId> {
        self.registry.focused()
    }

    /// See [`Registry::lookup_by_window`].
    pub fn lookup_by_window(&self, window: WindowId) -> Option<ClientId> {
        self.registry.lookup_by_window(window)
    }

    /// See [`Registry::lookup_by_icon`].
    pub fn lookup_by_icon(&self, icon: WindowId) -> Option<ClientId> {
        self.registry.lookup_by_icon(icon)
    }

    //  Registry operations

    /// Start managing `window`.
    ///
    /// Returns `Ok(None)` if the window asked not to be managed or is
    /// already managed.  Otherwise the window gets the border decoration and
    /// a click-to-focus button grab, is appended to the registration order
    /// as a visible client, and the manager tries to focus it.
    pub fn create(&mut self, window: WindowId) -> Result<Option<ClientId>, ManagerError> {
        if self.registry.client_for_window(window).is_some() {
            debug!("window {} is already managed", window);
            return Ok(None);
        }

        let attrs = self.ws.attributes(window).map_err(ws_err)?;
        if attrs.override_redirect {
            debug!("window {} is override-redirect, not managing", window);
            return Ok(None);
        }

        self.ws
            .set_border_width(window, self.decoration.border_width)
            .map_err(ws_err)?;

        let Some(id) = self
            .registry
            .insert(Client::new(window, attrs.class, attrs.geometry))
        else {
            return Ok(None);
        };
        info!("managing window {} as client {} at {}", window, id, attrs.geometry);

        self.ws.grab_button(window).map_err(ws_err)?;
        self.set_focus(Some(id))?;
        Ok(Some(id))
    }

    /// Stop managing a client.
    ///
    /// Icon or placeholder resources are released first, without touching
    /// the real window.  Unless `forced` is set (the window is already
    /// gone), the real window is then destroyed.  Focus is cleared if it was
    /// on this client; choosing a replacement is up to the caller.
    ///
    /// A stale `id` is ignored.
    pub fn destroy(&mut self, id: ClientId, forced: bool) -> Result<(), ManagerError> {
        let Some(client) = self.registry.get(id) else {
            debug!("destroy of unknown client {}", id);
            return Ok(());
        };
        let window = client.window();
        let kind = client.kind();

        if self.registry.focused() == Some(id) {
            self.registry.set_focused(None);
        }

        match kind {
            StateKind::Hidden => {
                self.leave_hidden(id, false)?;
            }
            StateKind::MoveResize => {
                self.abort_move_resize(id)?;
            }
            StateKind::Visible => {}
        }

        self.registry.remove(id);
        info!("released client {} (window {}, forced: {})", id, window, forced);

        let destroyed = if forced {
            Ok(())
        } else {
            self.ws.destroy_window(window).map_err(ws_err)
        };

        // The remaining icons are repacked even if the window could not be
        // destroyed; the client is already gone from the registry.
        self.refresh_icons()?;
        destroyed
    }

    //  State machine

    /// Iconify a visible client.
    pub fn hide(&mut self, id: ClientId) -> Result<(), ManagerError> {
        let Some(client) = self.visible(id, "hide") else {
            return Ok(());
        };
        let window = client.window();

        self.drop_focus_of(id)?;

        let (x, y) = ICON_SPAWN_POSITION;
        let surface = self
            .ws
            .create_surface(Geometry::new(x, y, self.icons.width, self.icons.height))
            .map_err(ws_err)?;

        let gc = match self.prepare_icon_surface(surface) {
            Ok(gc) => gc,
            Err(e) => {
                let _ = self.ws.destroy_window(surface);
                return Err(ws_err(e));
            }
        };

        if let Err(e) = self.ws.unmap_window(window) {
            let _ = self.ws.free_gc(gc);
            let _ = self.ws.destroy_window(surface);
            return Err(ws_err(e));
        }

        self.registry
            .replace_state(id, ClientState::Hidden(Icon { surface, gc, x, y }));
        debug!("client {} hidden behind icon {}", id, surface);

        self.refresh_icons()
    }

    fn prepare_icon_surface(&self, surface: WindowId) -> Result<GcId, W::Error> {
        self.ws.set_override_redirect(surface)?;
        self.ws.select_input(
            surface,
            EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::EXPOSURE,
        )?;
        self.ws.map_window(surface)?;
        self.ws.create_gc(surface)
    }

    /// Deiconify a hidden client: remap and raise its window, then release
    /// the icon.
    pub fn unhide(&mut self, id: ClientId) -> Result<(), ManagerError> {
        if self.leave_hidden(id, true)? {
            self.refresh_icons()?;
        }
        Ok(())
    }

    /// Release a hidden client's icon without remapping its window.
    ///
    /// Used when the window is about to be (or already has been) destroyed.
    pub fn unhide_forced(&mut self, id: ClientId) -> Result<(), ManagerError> {
        if self.leave_hidden(id, false)? {
            self.refresh_icons()?;
        }
        Ok(())
    }

    /// Hidden → Visible without the icon refresh.  `window_alive` decides
    /// whether the real window is remapped and raised.
    ///
    /// Returns whether a transition happened.
    fn leave_hidden(&mut self, id: ClientId, window_alive: bool) -> Result<bool, ManagerError> {
        let Some(client) = self.registry.get(id) else {
            return Ok(false);
        };
        if client.kind() != StateKind::Hidden {
            debug!("unhide ignored: client {} is {}", id, client.kind());
            return Ok(false);
        }
        let window = client.window();

        if window_alive {
            self.ws.map_window(window).map_err(ws_err)?;
            self.ws.raise_window(window).map_err(ws_err)?;
        }

        let old = self.registry.replace_state(id, ClientState::Visible);
        if let Some(ClientState::Hidden(icon)) = old {
            self.ws.destroy_window(icon.surface).map_err(ws_err)?;
            self.ws.free_gc(icon.gc).map_err(ws_err)?;
        }
        debug!("client {} visible again (remapped: {})", id, window_alive);
        Ok(true)
    }

    /// Replace a visible client with a placeholder the user can drag.
    ///
    /// The pointer is grabbed on the placeholder until
    /// [`end_move_resize`](ClientManager::end_move_resize).
    pub fn begin_move_resize(&mut self, id: ClientId) -> Result<(), ManagerError> {
        let Some(client) = self.visible(id, "begin_move_resize") else {
            return Ok(());
        };
        let window = client.window();
        let geometry = client.geometry();

        self.drop_focus_of(id)?;
        self.ws.unmap_window(window).map_err(ws_err)?;

        let surface = match self.ws.create_surface(geometry) {
            Ok(s) => s,
            Err(e) => {
                let _ = self.ws.map_window(window);
                return Err(ws_err(e));
            }
        };

        if let Err(e) = self.prepare_placeholder(surface) {
            let _ = self.ws.ungrab_pointer();
            let _ = self.ws.destroy_window(surface);
            let _ = self.ws.map_window(window);
            return Err(ws_err(e));
        }

        self.registry
            .replace_state(id, ClientState::MoveResize(Placeholder { surface }));
        debug!("client {} dragging placeholder {} from {}", id, surface, geometry);
        Ok(())
    }

    fn prepare_placeholder(&self, surface: WindowId) -> Result<(), W::Error> {
        self.ws.set_override_redirect(surface)?;
        self.ws.map_window(surface)?;
        self.ws.raise_window(surface)?;
        self.ws
            .grab_pointer(surface, EventMask::POINTER_MOTION | EventMask::BUTTON_RELEASE)
    }

    /// Commit a move/resize: adopt the placeholder's final geometry and put
    /// the real window back on screen there.
    pub fn end_move_resize(&mut self, id: ClientId) -> Result<(), ManagerError> {
        let Some(surface) = self
            .registry
            .get(id)
            .and_then(|c| c.placeholder())
            .map(|p| p.surface)
        else {
            debug!("end_move_resize ignored: client {} is not being moved", id);
            return Ok(());
        };

        self.ws.ungrab_pointer().map_err(ws_err)?;
        let geometry = self.ws.attributes(surface).map_err(ws_err)?.geometry;
        self.ws.destroy_window(surface).map_err(ws_err)?;

        self.registry.replace_state(id, ClientState::Visible);
        self.registry.set_geometry(id, geometry);

        let Some(window) = self.registry.get(id).map(Client::window) else {
            return Ok(());
        };
        self.ws.map_window(window).map_err(ws_err)?;
        self.ws.move_resize_window(window, geometry).map_err(ws_err)?;
        info!("client {} moved/resized to {}", id, geometry);
        self.raise(id)
    }

    /// MoveResize → gone: release the grab and the placeholder without
    /// touching the real window.
    fn abort_move_resize(&mut self, id: ClientId) -> Result<(), ManagerError> {
        let old = self.registry.replace_state(id, ClientState::Visible);
        if let Some(ClientState::MoveResize(p)) = old {
            self.ws.ungrab_pointer().map_err(ws_err)?;
            self.ws.destroy_window(p.surface).map_err(ws_err)?;
        }
        Ok(())
    }

    /// Raise a visible client to the top of the stacking order.
    pub fn raise(&mut self, id: ClientId) -> Result<(), ManagerError> {
        if let Some(client) = self.visible(id, "raise") {
            self.ws.raise_window(client.window()).map_err(ws_err)?;
        }
        Ok(())
    }

    /// Lower a visible client to the bottom of the stacking order.
    pub fn lower(&mut self, id: ClientId) -> Result<(), ManagerError> {
        if let Some(client) = self.visible(id, "lower") {
            self.ws.lower_window(client.window()).map_err(ws_err)?;
        }
        Ok(())
    }

    /// Resize a client to cover the screen below the icon row.
    ///
    /// Works in any state and never changes it.
    pub fn maximize(&mut self, id: ClientId) -> Result<(), ManagerError> {
        let Some(window) = self.registry.get(id).map(Client::window) else {
            return Ok(());
        };
        let (width, height) = self.ws.screen_size().map_err(ws_err)?;
        let geometry = Geometry::new(
            0,
            self.icons.height as i32,
            width,
            height.saturating_sub(self.icons.height),
        );
        self.registry.set_geometry(id, geometry);
        self.ws.move_resize_window(window, geometry).map_err(ws_err)?;
        debug!("client {} maximized to {}", id, geometry);
        Ok(())
    }

    /// The client currently being moved or resized, if any.
    fn dragging_client(&self) -> Option<ClientId> {
        self.registry
            .iter()
            .find(|(_, c)| c.kind() == StateKind::MoveResize)
            .map(|(id, _)| id)
    }

    /// Look up `id` and return it only if it is visible.
    fn visible(&self, id: ClientId, op: &str) -> Option<&Client> {
        let client = self.registry.get(id)?;
        if client.kind() != StateKind::Visible {
            debug!("{} ignored: client {} is {}", op, id, client.kind());
            return None;
        }
        Some(client)
    }

    //  Event dispatch

    /// Feed one windowing-system event into the core.
    ///
    /// Events about windows the core does not know are ignored.
    pub fn handle(&mut self, event: Event) -> Result<(), ManagerError> {
        match event {
            Event::WindowCreated(window) => {
                self.create(window)?;
            }

            Event::WindowDestroyed(window) => {
                if let Some(id) = self.registry.client_for_window(window) {
                    self.destroy(id, true)?;
                }
            }

            Event::ButtonPress { window } => {
                if let Some(id) = self.registry.lookup_by_window(window) {
                    self.set_focus(Some(id))?;
                } else if let Some(id) = self.registry.lookup_by_icon(window) {
                    self.unhide(id)?;
                }
            }

            Event::ButtonRelease { window } => {
                // A release reported on some other window still ends the
                // drag while a placeholder holds the pointer.
                let dragging = self
                    .registry
                    .lookup_by_placeholder(window)
                    .or_else(|| self.dragging_client());
                if let Some(id) = dragging {
                    self.end_move_resize(id)?;
                }
            }

            Event::Expose { window, count } => {
                // Only repaint once per burst of expose events.
                if count == 0 {
                    if let Some(id) = self.registry.lookup_by_icon(window) {
                        self.paint_icon(id)?;
                    }
                }
            }

            Event::Motion {
                window,
                root_x,
                root_y,
            } => {
                if self.registry.lookup_by_placeholder(window).is_some() {
                    self.ws.move_window(window, root_x, root_y).map_err(ws_err)?;
                } else {
                    debug!("motion for {} outside a move/resize", window);
                }
            }
        }
        Ok(())
    }
}
