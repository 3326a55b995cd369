//! X11 keycode translation for the `xinput test` capture path.
//!
//! `xinput test` prints raw X11 keycodes (evdev code + 8 under the usual
//! server setup).  The table below covers the US-QWERTY positions of the
//! supported key set; anything else degrades to the `"key_<n>"` placeholder,
//! which the executor on the far side will warn about and drop.

/// Translates an X11 keycode to a symbolic key name.
pub fn name_from_keycode(code: u32) -> String {
    if let Some(name) = known_keycode(code) {
        return name.to_string();
    }
    format!("key_{code}")
}

fn known_keycode(code: u32) -> Option<&'static str> {
    // US-QWERTY rows on a standard evdev-backed X server.
    let name = match code {
        // Top letter row
        24 => "q",
        25 => "w",
        26 => "e",
        27 => "r",
        28 => "t",
        29 => "y",
        30 => "u",
        31 => "i",
        32 => "o",
        33 => "p",
        // Home row
        38 => "a",
        39 => "s",
        40 => "d",
        41 => "f",
        42 => "g",
        43 => "h",
        44 => "j",
        45 => "k",
        46 => "l",
        // Bottom row
        52 => "z",
        53 => "x",
        54 => "c",
        55 => "v",
        56 => "b",
        57 => "n",
        58 => "m",
        // Named keys
        9 => "Escape",
        22 => "BackSpace",
        23 => "Tab",
        36 => "Return",
        65 => "space",
        // Modifiers
        37 => "Control_L",
        50 => "Shift_L",
        64 => "Alt_L",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_row_letters() {
        assert_eq!(name_from_keycode(38), "a");
        assert_eq!(name_from_keycode(39), "s");
        assert_eq!(name_from_keycode(46), "l");
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(name_from_keycode(36), "Return");
        assert_eq!(name_from_keycode(9), "Escape");
        assert_eq!(name_from_keycode(65), "space");
        assert_eq!(name_from_keycode(22), "BackSpace");
        assert_eq!(name_from_keycode(23), "Tab");
    }

    #[test]
    fn test_modifier_keycodes() {
        assert_eq!(name_from_keycode(37), "Control_L");
        assert_eq!(name_from_keycode(50), "Shift_L");
        assert_eq!(name_from_keycode(64), "Alt_L");
    }

    #[test]
    fn test_unknown_codes_use_placeholder() {
        assert_eq!(name_from_keycode(200), "key_200");
        assert_eq!(name_from_keycode(0), "key_0");
    }
}
