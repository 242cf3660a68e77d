//! Core traits that decouple smallwm from any specific windowing system or
//! event transport.
//!
//! Every concrete backend (X11 via x11rb, a test harness, …) implements one
//! of these traits.  The [`ClientManager`](crate::manager::ClientManager)
//! only depends on these abstractions.

use crate::types::{Event, EventMask, GcId, Geometry, WindowAttributes, WindowId};

/// Abstraction over the windowing system the client core drives.
///
/// Requests are fire-and-forget from the core's point of view; the two
/// queries used to check invariants ([`attributes`](WindowSystem::attributes)
/// and [`input_focus`](WindowSystem::input_focus)) must reflect every request
/// issued before them.
///
/// Methods take `&self`: an implementation might share one connection, or
/// it might be a recording stub used in tests.
pub trait WindowSystem {
    /// The error type produced by this windowing system.
    type Error: std::error::Error + Send + 'static;

    /// Query geometry, class, map state and the override-redirect flag.
    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, Self::Error>;

    /// Set the border width of `window`.
    fn set_border_width(&self, window: WindowId, width: u32) -> Result<(), Self::Error>;

    /// Create a plain top-level surface (1px border) at `geometry`.
    ///
    /// The surface is created unmapped.
    fn create_surface(&self, geometry: Geometry) -> Result<WindowId, Self::Error>;

    /// Mark `window` as "do not manage" (override-redirect).
    fn set_override_redirect(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Subscribe to the notifications in `mask` on `window`.
    fn select_input(&self, window: WindowId, mask: EventMask) -> Result<(), Self::Error>;

    fn destroy_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn map_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn unmap_window(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Move `window` to the top of the stacking order.
    fn raise_window(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Move `window` to the bottom of the stacking order.
    fn lower_window(&self, window: WindowId) -> Result<(), Self::Error>;

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), Self::Error>;

    fn move_resize_window(&self, window: WindowId, geometry: Geometry) -> Result<(), Self::Error>;

    /// Allocate a drawing context for `window`.
    fn create_gc(&self, window: WindowId) -> Result<GcId, Self::Error>;

    fn free_gc(&self, gc: GcId) -> Result<(), Self::Error>;

    /// Clear the whole contents of `window` to its background.
    fn clear_window(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Draw `text` with its baseline origin at `(x, y)`.
    fn draw_text(
        &self,
        window: WindowId,
        gc: GcId,
        x: i32,
        y: i32,
        text: &str,
    ) -> Result<(), Self::Error>;

    /// Return the title of `window`, or `None` if it has none.
    fn fetch_name(&self, window: WindowId) -> Result<Option<String>, Self::Error>;

    /// Install a passive grab for any button with any modifier on `window`.
    fn grab_button(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Remove the passive grab installed by [`grab_button`](WindowSystem::grab_button).
    fn ungrab_button(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Actively grab the pointer, delivering the notifications in `mask`
    /// exclusively to `window`.
    fn grab_pointer(&self, window: WindowId, mask: EventMask) -> Result<(), Self::Error>;

    fn ungrab_pointer(&self) -> Result<(), Self::Error>;

    /// Request keyboard focus for `window`, reverting to the pointer root.
    fn set_input_focus(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Return the window currently holding input focus, or `None` if focus
    /// is on no window (or on the root / pointer root).
    fn input_focus(&self) -> Result<Option<WindowId>, Self::Error>;

    /// Size of the screen as `(width, height)`.
    fn screen_size(&self) -> Result<(u32, u32), Self::Error>;
}

//  Event Source

/// A source of [`Event`]s.
///
/// The client core is single-threaded: the event loop pulls one event at a
/// time on the thread that owns the windowing connection and hands it to
/// [`ClientManager::handle`](crate::manager::ClientManager::handle) before
/// pulling the next.
///
/// # Contract
///
/// * [`next_event`](EventSource::next_event) **blocks** until an event
///   relevant to the core arrives.  Pending requests are flushed first.
/// * `Ok(None)` means the source is exhausted and the loop should stop.
pub trait EventSource {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    fn next_event(&self) -> Result<Option<Event>, Self::Error>;
}
