//! In-memory [`WindowSystem`] used by the unit tests.
//!
//! Windows live in a map keyed by id.  Every request is appended to a call
//! log, and any request that names a window or drawing context that does
//! not exist fails, so tests catch use-after-destroy.

use crate::traits::WindowSystem;
use crate::types::{EventMask, GcId, Geometry, MapState, WindowAttributes, WindowClass, WindowId};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

/// One request received by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetBorder(WindowId, u32),
    CreateSurface(WindowId, Geometry),
    SetOverrideRedirect(WindowId),
    SelectInput(WindowId, EventMask),
    Destroy(WindowId),
    Map(WindowId),
    Unmap(WindowId),
    Raise(WindowId),
    Lower(WindowId),
    Move(WindowId, i32, i32),
    MoveResize(WindowId, Geometry),
    CreateGc(WindowId, GcId),
    FreeGc(GcId),
    Clear(WindowId),
    DrawText(WindowId, String),
    GrabButton(WindowId),
    UngrabButton(WindowId),
    GrabPointer(WindowId, EventMask),
    UngrabPointer,
    SetInputFocus(WindowId),
}

#[derive(Debug, thiserror::Error)]
pub enum FakeError {
    #[error("bad window {0}")]
    BadWindow(WindowId),
    #[error("bad graphics context {0:?}")]
    BadGc(GcId),
    #[error("{0} failed")]
    Injected(&'static str),
}

#[derive(Debug, Clone)]
struct FakeWindow {
    geometry: Geometry,
    class: WindowClass,
    mapped: bool,
    override_redirect: bool,
    title: Option<String>,
    button_grab: bool,
}

pub struct FakeWindowSystem {
    screen: (u32, u32),
    windows: RefCell<BTreeMap<WindowId, FakeWindow>>,
    gcs: RefCell<BTreeSet<u32>>,
    next_id: Cell<u32>,
    focus: Cell<Option<WindowId>>,
    honor_focus: Cell<bool>,
    pointer_grab: Cell<Option<WindowId>>,
    fail_on: Cell<Option<&'static str>>,
    calls: RefCell<Vec<Call>>,
}

impl FakeWindowSystem {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: (width, height),
            windows: RefCell::new(BTreeMap::new()),
            gcs: RefCell::new(BTreeSet::new()),
            next_id: Cell::new(0x100),
            focus: Cell::new(None),
            honor_focus: Cell::new(true),
            pointer_grab: Cell::new(None),
            fail_on: Cell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn alloc_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Add a mapped, input-output client window.
    pub fn add_window(&self, geometry: Geometry, title: Option<&str>) -> WindowId {
        let id = WindowId(self.alloc_id());
        self.windows.borrow_mut().insert(
            id,
            FakeWindow {
                geometry,
                class: WindowClass::InputOutput,
                mapped: true,
                override_redirect: false,
                title: title.map(str::to_string),
                button_grab: false,
            },
        );
        id
    }

    /// Simulate the window disappearing behind the manager's back.
    pub fn kill(&self, window: WindowId) {
        self.windows.borrow_mut().remove(&window);
        if self.focus.get() == Some(window) {
            self.focus.set(None);
        }
    }

    /// Make every request named `op` (the trait method name) fail until
    /// reset with `None`.
    pub fn fail_on(&self, op: Option<&'static str>) {
        self.fail_on.set(op);
    }

    fn injected(&self, op: &'static str) -> Result<(), FakeError> {
        if self.fail_on.get() == Some(op) {
            return Err(FakeError::Injected(op));
        }
        Ok(())
    }

    /// When `false`, focus requests are silently superseded.
    pub fn set_honor_focus(&self, honor: bool) {
        self.honor_focus.set(honor);
    }

    pub fn set_class(&self, window: WindowId, class: WindowClass) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.class = class;
        }
    }

    pub fn set_override_redirect_flag(&self, window: WindowId) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.override_redirect = true;
        }
    }

    pub fn set_mapped(&self, window: WindowId, mapped: bool) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.mapped = mapped;
        }
    }

    /// Change a window's geometry without logging a call (as a user drag
    /// forwarded by the event loop would).
    pub fn set_geometry(&self, window: WindowId, geometry: Geometry) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&window) {
            w.geometry = geometry;
        }
    }

    pub fn exists(&self, window: WindowId) -> bool {
        self.windows.borrow().contains_key(&window)
    }

    pub fn is_mapped(&self, window: WindowId) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .map(|w| w.mapped)
            .unwrap_or(false)
    }

    pub fn is_override_redirect(&self, window: WindowId) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .map(|w| w.override_redirect)
            .unwrap_or(false)
    }

    pub fn has_button_grab(&self, window: WindowId) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .map(|w| w.button_grab)
            .unwrap_or(false)
    }

    pub fn geometry(&self, window: WindowId) -> Option<Geometry> {
        self.windows.borrow().get(&window).map(|w| w.geometry)
    }

    pub fn focus(&self) -> Option<WindowId> {
        self.focus.get()
    }

    pub fn pointer_grab(&self) -> Option<WindowId> {
        self.pointer_grab.get()
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    pub fn live_gc_count(&self) -> usize {
        self.gcs.borrow().len()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn with_window<T>(
        &self,
        window: WindowId,
        f: impl FnOnce(&mut FakeWindow) -> T,
    ) -> Result<T, FakeError> {
        self.windows
            .borrow_mut()
            .get_mut(&window)
            .map(f)
            .ok_or(FakeError::BadWindow(window))
    }
}

impl WindowSystem for FakeWindowSystem {
    type Error = FakeError;

    fn attributes(&self, window: WindowId) -> Result<WindowAttributes, FakeError> {
        self.with_window(window, |w| WindowAttributes {
            geometry: w.geometry,
            class: w.class,
            map_state: if w.mapped {
                MapState::Viewable
            } else {
                MapState::Unmapped
            },
            override_redirect: w.override_redirect,
        })
    }

    fn set_border_width(&self, window: WindowId, width: u32) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.record(Call::SetBorder(window, width));
        Ok(())
    }

    fn create_surface(&self, geometry: Geometry) -> Result<WindowId, FakeError> {
        self.injected("create_surface")?;
        let id = WindowId(self.alloc_id());
        self.windows.borrow_mut().insert(
            id,
            FakeWindow {
                geometry,
                class: WindowClass::InputOutput,
                mapped: false,
                override_redirect: false,
                title: None,
                button_grab: false,
            },
        );
        self.record(Call::CreateSurface(id, geometry));
        Ok(id)
    }

    fn set_override_redirect(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("set_override_redirect")?;
        self.with_window(window, |w| w.override_redirect = true)?;
        self.record(Call::SetOverrideRedirect(window));
        Ok(())
    }

    fn select_input(&self, window: WindowId, mask: EventMask) -> Result<(), FakeError> {
        self.injected("select_input")?;
        self.with_window(window, |_| ())?;
        self.record(Call::SelectInput(window, mask));
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("destroy_window")?;
        self.with_window(window, |_| ())?;
        self.kill(window);
        self.record(Call::Destroy(window));
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("map_window")?;
        self.with_window(window, |w| w.mapped = true)?;
        self.record(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("unmap_window")?;
        self.with_window(window, |w| w.mapped = false)?;
        if self.focus.get() == Some(window) {
            self.focus.set(None);
        }
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn raise_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("raise_window")?;
        self.with_window(window, |_| ())?;
        self.record(Call::Raise(window));
        Ok(())
    }

    fn lower_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.record(Call::Lower(window));
        Ok(())
    }

    fn move_window(&self, window: WindowId, x: i32, y: i32) -> Result<(), FakeError> {
        self.with_window(window, |w| {
            w.geometry.x = x;
            w.geometry.y = y;
        })?;
        self.record(Call::Move(window, x, y));
        Ok(())
    }

    fn move_resize_window(&self, window: WindowId, geometry: Geometry) -> Result<(), FakeError> {
        self.with_window(window, |w| w.geometry = geometry)?;
        self.record(Call::MoveResize(window, geometry));
        Ok(())
    }

    fn create_gc(&self, window: WindowId) -> Result<GcId, FakeError> {
        self.injected("create_gc")?;
        self.with_window(window, |_| ())?;
        let gc = GcId(self.alloc_id());
        self.gcs.borrow_mut().insert(gc.0);
        self.record(Call::CreateGc(window, gc));
        Ok(gc)
    }

    fn free_gc(&self, gc: GcId) -> Result<(), FakeError> {
        if !self.gcs.borrow_mut().remove(&gc.0) {
            return Err(FakeError::BadGc(gc));
        }
        self.record(Call::FreeGc(gc));
        Ok(())
    }

    fn clear_window(&self, window: WindowId) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        self.record(Call::Clear(window));
        Ok(())
    }

    fn draw_text(
        &self,
        window: WindowId,
        gc: GcId,
        _x: i32,
        _y: i32,
        text: &str,
    ) -> Result<(), FakeError> {
        self.with_window(window, |_| ())?;
        if !self.gcs.borrow().contains(&gc.0) {
            return Err(FakeError::BadGc(gc));
        }
        self.record(Call::DrawText(window, text.to_string()));
        Ok(())
    }

    fn fetch_name(&self, window: WindowId) -> Result<Option<String>, FakeError> {
        self.with_window(window, |w| w.title.clone())
    }

    fn grab_button(&self, window: WindowId) -> Result<(), FakeError> {
        self.injected("grab_button")?;
        self.with_window(window, |w| w.button_grab = true)?;
        self.record(Call::GrabButton(window));
        Ok(())
    }

    fn ungrab_button(&self, window: WindowId) -> Result<(), FakeError> {
        self.with_window(window, |w| w.button_grab = false)?;
        self.record(Call::UngrabButton(window));
        Ok(())
    }

    fn grab_pointer(&self, window: WindowId, mask: EventMask) -> Result<(), FakeError> {
        self.injected("grab_pointer")?;
        self.with_window(window, |_| ())?;
        self.pointer_grab.set(Some(window));
        self.record(Call::GrabPointer(window, mask));
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<(), FakeError> {
        self.pointer_grab.set(None);
        self.record(Call::UngrabPointer);
        Ok(())
    }

    fn set_input_focus(&self, window: WindowId) -> Result<(), FakeError> {
        let viewable = self.with_window(window, |w| w.mapped)?;
        if self.honor_focus.get() && viewable {
            self.focus.set(Some(window));
        }
        self.record(Call::SetInputFocus(window));
        Ok(())
    }

    fn input_focus(&self) -> Result<Option<WindowId>, FakeError> {
        Ok(self.focus.get())
    }

    fn screen_size(&self) -> Result<(u32, u32), FakeError> {
        Ok(self.screen)
    }
}
