//! Contains logic for reading the focused window in different environments.
//! [GenericWindowManager] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    /// Title of the window currently in focus. For example 'bash in hello' or 'Document 1' or
    /// 'Vibing in YouTube - Chrome'. May be empty when nothing has focus.
    fn get_active_window_title(&mut self) -> Result<String>;
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowManager;
                Ok(Self {
                    inner: Box::new(WindowsWindowManager::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Ok(Self {
                    inner: Box::new(LinuxWindowManager::new()?),
                })
            }
            else {
                anyhow::bail!(
                    "daynote was built without a window backend. Rebuild with `--features x11` or `--features win`"
                )
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window_title(&mut self) -> Result<String> {
        self.inner.get_active_window_title()
    }
}
