//! Key code translation tables for cross-platform keyboard event mapping.
//!
//! The canonical representation on the wire is the symbolic key *name*
//! (`"a"`..`"z"`, `"Return"`, `"Escape"`, `"Tab"`, `"space"`, `"BackSpace"`,
//! `"Control_L"`, `"Shift_L"`, `"Alt_L"`).  Platform codes are translated
//! to and from names at the capture and injection boundaries.

pub mod linux_x11;
pub mod windows_vk;

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a symbolic key name to a Windows Virtual Key code.
    ///
    /// Returns `None` for names outside the supported set.
    pub fn name_to_windows_vk(name: &str) -> Option<u16> {
        windows_vk::vk_from_name(name)
    }

    /// Translates a Windows Virtual Key code to a symbolic key name.
    ///
    /// Returns `None` for VK codes outside the supported set.
    pub fn windows_vk_to_name(vk: u16) -> Option<&'static str> {
        windows_vk::name_from_vk(vk)
    }

    /// Translates an X11 keycode (as printed by `xinput test`) to a
    /// symbolic key name.  Unknown codes fall back to `"key_<n>"`.
    pub fn x11_keycode_to_name(code: u32) -> String {
        linux_x11::name_from_keycode(code)
    }
}

/// True when `name` denotes a modifier key rather than a regular key.
///
/// Modifier keys never travel as `keyboard` events of their own; capture
/// reports them through the `modifiers` set and executors bracket them
/// around the main key.
pub fn is_modifier_name(name: &str) -> bool {
    matches!(name, "Control_L" | "Shift_L" | "Alt_L")
}
