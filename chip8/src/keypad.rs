use crate::error::{Fault, Result};
use crate::KEY_COUNT;

/// A keypad index resolved from a host key label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key(Option<usize>);

impl Key {
    /// Map the left-hand block of a QWERTY keyboard onto the hex keypad
    pub fn from_label(value: &str) -> Self {
        match value {
            "1" => Self(Some(0x1)), // 1 -> 1
            "2" => Self(Some(0x2)), // 2 -> 2
            "3" => Self(Some(0x3)), // 3 -> 3
            "4" => Self(Some(0xC)), // 4 -> C
            "q" => Self(Some(0x4)), // Q -> 4
            "w" => Self(Some(0x5)), // W -> 5
            "e" => Self(Some(0x6)), // E -> 6
            "r" => Self(Some(0xD)), // R -> D
            "a" => Self(Some(0x7)), // A -> 7
            "s" => Self(Some(0x8)), // S -> 8
            "d" => Self(Some(0x9)), // D -> 9
            "f" => Self(Some(0xE)), // F -> E
            "z" => Self(Some(0xA)), // Z -> A
            "x" => Self(Some(0x0)), // X -> 0
            "c" => Self(Some(0xB)), // C -> B
            "v" => Self(Some(0xF)), // V -> F
            _ => Self(None),
        }
    }

    pub fn index(self) -> Option<usize> {
        self.0
    }
}

/// Key states written by the host and read by instructions
pub struct Keypad {
    pub(crate) keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: [false; KEY_COUNT],
        }
    }

    pub fn reset(&mut self) {
        self.keys.fill(false);
    }

    pub fn set_key(&mut self, index: usize, pressed: bool) -> Result<()> {
        let key = self.keys.get_mut(index).ok_or(Fault::InvalidKey(index))?;
        *key = pressed;
        Ok(())
    }

    /// Only the low nibble of `key` selects the key
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0xF) as usize]
    }

    /// The lowest-numbered key currently held down
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&pressed| pressed).map(|key| key as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, Keypad};
    use crate::error::Fault;

    #[test]
    fn test_from_label() {
        assert_eq!(Key::from_label("x").index(), Some(0x0));
        assert_eq!(Key::from_label("v").index(), Some(0xF));
        assert_eq!(Key::from_label("p").index(), None);
    }

    #[test]
    fn test_set_key() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);
        keypad.set_key(0xA, true).unwrap();
        keypad.set_key(0x3, true).unwrap();
        assert!(keypad.is_pressed(0xA));
        assert!(keypad.is_pressed(0x1A));
        assert_eq!(keypad.first_pressed(), Some(0x3));
        keypad.set_key(0x3, false).unwrap();
        assert_eq!(keypad.first_pressed(), Some(0xA));
        assert_eq!(keypad.set_key(0x10, true), Err(Fault::InvalidKey(0x10)));
    }
}
