//! Click-to-focus controller.
//!
//! Every window that does not hold focus carries a passive grab on all
//! buttons, so a click on it reaches the manager first.  Focusing a window
//! removes its grab; losing focus re-arms it.
//!
//! Focus requests race with focus changes made outside the manager, so
//! [`ClientManager::set_focus`] never trusts its own request: it re-reads the
//! focus holder from the windowing system before recording anything.

use crate::client::StateKind;
use crate::manager::{ws_err, ClientManager, ManagerError};
use crate::registry::ClientId;
use crate::traits::WindowSystem;
use crate::types::{MapState, WindowClass};
use log::{debug, info, warn};

impl<W: WindowSystem> ClientManager<W> {
    /// Move input focus to `target`.
    ///
    /// 1. The current focus holder (if any) gets its button grab back.
    /// 2. With no target, or an input-only target, stop there: the recorded
    ///    focus is left as it was.
    /// 3. A target that is not viewable is not focused.
    /// 4. Otherwise the target's grab is released and focus requested.
    /// 5. If the windowing system then reports a different focus holder, the
    ///    target's grab is re-armed and nothing is recorded as focused;
    ///    otherwise the target is raised and recorded.
    pub fn set_focus(&mut self, target: Option<ClientId>) -> Result<(), ManagerError> {
        if let Some(current) = self.registry.focused().and_then(|id| self.registry.get(id)) {
            self.ws.grab_button(current.window()).map_err(ws_err)?;
        }

        let Some(id) = target else {
            return Ok(());
        };
        let Some(client) = self.registry.get(id) else {
            debug!("set_focus on unknown client {}", id);
            return Ok(());
        };
        if client.kind() != StateKind::Visible {
            debug!("set_focus ignored: client {} is {}", id, client.kind());
            return Ok(());
        }
        if client.class() == WindowClass::InputOnly {
            debug!("client {} is input-only, cannot take focus", id);
            return Ok(());
        }
        let window = client.window();

        let attrs = self.ws.attributes(window).map_err(ws_err)?;
        if attrs.map_state != MapState::Viewable {
            debug!("client {} is not viewable ({:?}), not focusing", id, attrs.map_state);
            return Ok(());
        }

        self.ws.ungrab_button(window).map_err(ws_err)?;
        self.ws.set_input_focus(window).map_err(ws_err)?;

        let actual = self.ws.input_focus().map_err(ws_err)?;
        if actual != Some(window) {
            warn!(
                "focus request for {} not honored (focus is on {:?})",
                window, actual
            );
            self.ws.grab_button(window).map_err(ws_err)?;
            self.registry.set_focused(None);
        } else {
            self.raise(id)?;
            self.registry.set_focused(Some(id));
            info!("focused client {} (window {})", id, window);
        }
        Ok(())
    }

    /// Forget focus on `id` if it holds it, re-arming its button grab.
    ///
    /// Called before a focused client leaves the visible state.
    pub(crate) fn drop_focus_of(&mut self, id: ClientId) -> Result<(), ManagerError> {
        if self.registry.focused() != Some(id) {
            return Ok(());
        }
        if let Some(client) = self.registry.get(id) {
            self.ws.grab_button(client.window()).map_err(ws_err)?;
        }
        self.registry.set_focused(None);
        Ok(())
    }
}
