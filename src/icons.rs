//! Icon row layout.
//!
//! Hidden clients are shown as small labelled icons packed left-to-right,
//! top-to-bottom from the top-left corner of the screen, in registration
//! order.  The whole row is recomputed whenever the set of hidden clients
//! may have changed; the set is small enough that incremental updates are
//! not worth their bookkeeping.

use crate::client::StateKind;
use crate::manager::{ws_err, ClientManager, ManagerError};
use crate::registry::ClientId;
use crate::traits::WindowSystem;
use log::debug;

/// Label drawn for a window without a title.
const BLANK_LABEL: &str = " ";

/// Compute the positions of `count` icons of `icon_width × icon_height`
/// on a screen `screen_width` pixels wide.
///
/// An icon that would overflow the right edge starts a new row.  The first
/// icon of a row is always placed, even on a screen narrower than one icon.
pub fn pack_icons(
    count: usize,
    screen_width: u32,
    icon_width: u32,
    icon_height: u32,
) -> Vec<(i32, i32)> {
    let mut positions = Vec::with_capacity(count);
    let (mut x, mut y) = (0u32, 0u32);
    for _ in 0..count {
        if x > 0 && x.saturating_add(icon_width) > screen_width {
            x = 0;
            y = y.saturating_add(icon_height);
        }
        positions.push((x as i32, y as i32));
        x = x.saturating_add(icon_width);
    }
    positions
}

/// The label for a window titled `title`: at most `max_chars` characters.
pub fn icon_label(title: Option<&str>, max_chars: usize) -> String {
    match title {
        Some(t) if !t.is_empty() && max_chars > 0 => t.chars().take(max_chars).collect(),
        _ => BLANK_LABEL.to_string(),
    }
}

impl<W: WindowSystem> ClientManager<W> {
    /// Reposition and repaint the icon of every hidden client.
    pub fn refresh_icons(&mut self) -> Result<(), ManagerError> {
        let hidden: Vec<ClientId> = self
            .registry
            .iter()
            .filter(|(_, c)| c.kind() == StateKind::Hidden)
            .map(|(id, _)| id)
            .collect();
        if hidden.is_empty() {
            return Ok(());
        }

        let (screen_width, _) = self.ws.screen_size().map_err(ws_err)?;
        let positions = pack_icons(
            hidden.len(),
            screen_width,
            self.icons.width,
            self.icons.height,
        );

        for (id, (x, y)) in hidden.into_iter().zip(positions) {
            self.registry.set_icon_position(id, x, y);
            if let Some(icon) = self.registry.get(id).and_then(|c| c.icon()) {
                self.ws.move_window(icon.surface, x, y).map_err(ws_err)?;
            }
            self.paint_icon(id)?;
        }
        Ok(())
    }

    /// Redraw the label of a hidden client's icon.
    ///
    /// The title is fetched best-effort: a window without one, or one whose
    /// title cannot be read, gets a blank label.
    pub fn paint_icon(&self, id: ClientId) -> Result<(), ManagerError> {
        let Some(client) = self.registry.get(id) else {
            return Ok(());
        };
        let Some(icon) = client.icon() else {
            return Ok(());
        };

        self.ws.clear_window(icon.surface).map_err(ws_err)?;

        let title = self.ws.fetch_name(client.window()).unwrap_or_else(|e| {
            debug!("no title for {}: {}", client.window(), e);
            None
        });
        let label = icon_label(title.as_deref(), self.icons.label_chars);
        self.ws
            .draw_text(icon.surface, icon.gc, 0, self.icons.height as i32, &label)
            .map_err(ws_err)
    }
}
