//! Windows Virtual Key (VK) code translation for the supported key set.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).  The supported set is
//! the one the capture poller watches: the alphabet, the handful of named
//! editing keys, and the three modifiers.

/// `VK_LBUTTON`
pub const VK_LBUTTON: u16 = 0x01;
/// `VK_RBUTTON`
pub const VK_RBUTTON: u16 = 0x02;
/// `VK_MBUTTON`
pub const VK_MBUTTON: u16 = 0x04;
/// `VK_SHIFT`
pub const VK_SHIFT: u16 = 0x10;
/// `VK_CONTROL`
pub const VK_CONTROL: u16 = 0x11;
/// `VK_MENU` (Alt)
pub const VK_MENU: u16 = 0x12;

/// Translates a symbolic key name to its Windows VK code.
///
/// Returns `None` for names outside the supported set; callers drop such
/// events with a warning rather than failing.
pub fn vk_from_name(name: &str) -> Option<u16> {
    let mut chars = name.chars();
    if let (Some(c @ 'a'..='z'), None) = (chars.next(), chars.next()) {
        // VK_A..VK_Z are the ASCII uppercase codes 0x41..0x5A.
        return Some(0x41 + (c as u16 - 'a' as u16));
    }

    match name {
        "Return" => Some(0x0D),
        "Escape" => Some(0x1B),
        "Tab" => Some(0x09),
        "space" => Some(0x20),
        "BackSpace" => Some(0x08),
        "Control_L" => Some(VK_CONTROL),
        "Shift_L" => Some(VK_SHIFT),
        "Alt_L" => Some(VK_MENU),
        _ => None,
    }
}

/// Translates a Windows VK code back to its symbolic key name.
pub fn name_from_vk(vk: u16) -> Option<&'static str> {
    const LETTERS: [&str; 26] = [
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q",
        "r", "s", "t", "u", "v", "w", "x", "y", "z",
    ];
    if (0x41..=0x5A).contains(&vk) {
        return Some(LETTERS[(vk - 0x41) as usize]);
    }

    match vk {
        0x0D => Some("Return"),
        0x1B => Some("Escape"),
        0x09 => Some("Tab"),
        0x20 => Some("space"),
        0x08 => Some("BackSpace"),
        VK_CONTROL => Some("Control_L"),
        VK_SHIFT => Some("Shift_L"),
        VK_MENU => Some("Alt_L"),
        _ => None,
    }
}
