//! Host-side contract the wallpaper plugs into.
//!
//! The host owns the render loop and an ordered list of modules. Every host
//! frame it calls `update` then `draw` on each module in list order, so
//! index 0 is drawn first and ends up underneath everything else.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::compositor::Canvas;
use crate::lifecycle::WallpaperSlot;

/// A drawable, updatable region managed by the host.
pub trait Module {
    fn name(&self) -> &str;

    /// Called once per host frame with the elapsed game time in seconds
    fn update(&mut self, t: f32);

    /// Called once per host frame after every module has been updated
    fn draw(&mut self, t: f32, canvas: &mut Canvas);

    /// The host is destroying this module
    fn killed(&mut self);
}

/// Shared handle to a module in the host's list
pub type ModuleRef = Rc<RefCell<dyn Module>>;

fn same_module<T: ?Sized, U: ?Sized>(a: &Rc<RefCell<T>>, b: &Rc<RefCell<U>>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Ordered list of modules, compared by identity.
#[derive(Default)]
pub struct ModuleList {
    modules: Vec<ModuleRef>,
}

impl ModuleList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `module` at `index` (clamped to the list length).
    ///
    /// Returns false, leaving the list untouched, if the module is already
    /// a member.
    pub fn insert(&mut self, index: usize, module: ModuleRef) -> bool {
        if self.contains(&module) {
            log::warn!(
                "Module '{}' is already registered, ignoring insert",
                module.borrow().name()
            );
            return false;
        }

        let index = index.min(self.modules.len());
        self.modules.insert(index, module);
        true
    }

    pub fn push(&mut self, module: ModuleRef) -> bool {
        self.insert(self.modules.len(), module)
    }

    /// Remove `module` by identity. Returns false if it was not a member.
    pub fn remove<T: ?Sized>(&mut self, module: &Rc<RefCell<T>>) -> bool {
        match self.position(module) {
            Some(index) => {
                self.modules.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn position<T: ?Sized>(&self, module: &Rc<RefCell<T>>) -> Option<usize> {
        self.modules.iter().position(|m| same_module(m, module))
    }

    pub fn contains<T: ?Sized>(&self, module: &Rc<RefCell<T>>) -> bool {
        self.position(module).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ModuleRef> {
        self.modules.get(index)
    }

    /// Clone the current membership so modules can be called while the
    /// list itself is free to change.
    pub fn snapshot(&self) -> Vec<ModuleRef> {
        self.modules.clone()
    }

    fn drain(&mut self) -> Vec<ModuleRef> {
        std::mem::take(&mut self.modules)
    }
}

/// Line-oriented diagnostic output provided by the host.
pub trait TextSink {
    fn write(&self, line: &str);
}

/// Buffered text sink standing in for the host's terminal window.
#[derive(Debug, Default)]
pub struct Terminal {
    lines: RefCell<Vec<String>>,
    echo: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also print every line to stdout as it arrives
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// Whether any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl TextSink for Terminal {
    fn write(&self, line: &str) {
        if self.echo {
            println!("{}", line);
        }
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Everything a module needs from the host, passed around explicitly.
pub struct HostContext {
    pub modules: ModuleList,
    wallpaper: Rc<WallpaperSlot>,
    sink: Rc<dyn TextSink>,
    focused: Rc<Cell<bool>>,
    width: u32,
    height: u32,
    tick_rate: u32,
}

impl HostContext {
    pub fn new(width: u32, height: u32, sink: Rc<dyn TextSink>) -> Self {
        Self {
            modules: ModuleList::new(),
            wallpaper: Rc::new(WallpaperSlot::default()),
            sink,
            focused: Rc::new(Cell::new(false)),
            width,
            height,
            tick_rate: common::DEFAULT_HOST_TICK_RATE,
        }
    }

    /// Override the rate at which the host calls `update`
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate.max(1);
        self
    }

    pub fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn sink(&self) -> Rc<dyn TextSink> {
        Rc::clone(&self.sink)
    }

    /// Slot holding the active wallpaper, if any
    pub fn wallpaper(&self) -> &Rc<WallpaperSlot> {
        &self.wallpaper
    }

    pub fn focus_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.focused)
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.set(focused);
    }

    pub fn update_modules(&self, t: f32) {
        for module in self.modules.snapshot() {
            module.borrow_mut().update(t);
        }
    }

    pub fn draw_modules(&self, t: f32, canvas: &mut Canvas) {
        for module in self.modules.snapshot() {
            module.borrow_mut().draw(t, canvas);
        }
    }

    /// Forward a tick to the active wallpaper without going through the
    /// module list. Returns true if the wallpaper advanced a frame.
    pub fn manual_tick(&self, t: f32) -> bool {
        match self.wallpaper.current() {
            Some(player) => player.borrow_mut().manual_update(t),
            None => false,
        }
    }

    /// Host shutdown: empty the module list, then notify every module.
    pub fn kill_all(&mut self) {
        let modules = self.modules.drain();
        log::debug!("Killing {} module(s)", modules.len());
        for module in modules {
            module.borrow_mut().killed();
        }
    }
}
