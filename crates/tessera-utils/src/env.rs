//! Host environment facts that change keyboard behaviour.

/// Facts about the platform the editor runs on.
///
/// Passed explicitly to whoever needs them instead of being detected from a
/// global, so tests can pin a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Env {
    /// Apple platforms map `Ctrl` in keystroke definitions to `Cmd`.
    pub is_mac: bool,
}

impl Env {
    /// Environment of the machine running this code.
    pub fn detect() -> Self {
        Self {
            is_mac: cfg!(any(target_os = "macos", target_os = "ios")),
        }
    }

    pub fn mac() -> Self {
        Self { is_mac: true }
    }

    pub fn other() -> Self {
        Self { is_mac: false }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::detect()
    }
}
