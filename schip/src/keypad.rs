//! Hexadecimal keypad input.
use std::fmt;

use crate::constants::*;

/// One of the 16 keys of the COSMAC VIP keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8"))]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode(key_id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidKeyCode(pub u8);

impl std::error::Error for InvalidKeyCode {}

impl fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "keycode must be in range 0 <= keycode < {KEY_COUNT}, got {}",
            self.0
        )
    }
}

/// Pressed state of all keys. Pressed is a 1 bit, released is a 0 bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keypad(u16);

impl Keypad {
    pub fn set(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.0 |= 1 << key.as_u8();
        } else {
            self.0 &= !(1 << key.as_u8());
        }
    }

    #[inline]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.0 & (1 << key.as_u8()) != 0
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// Lowest key that is pressed down.
    #[inline]
    pub fn first_pressed(&self) -> Option<KeyCode> {
        if self.any() {
            KeyCode::try_from(self.0.trailing_zeros() as u8).ok()
        } else {
            None
        }
    }

    /// Set all keys to up.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn iter_pressed(&self) -> impl Iterator<Item = KeyCode> + '_ {
        (0..KEY_COUNT)
            .filter_map(|k| KeyCode::try_from(k).ok())
            .filter(|k| self.is_pressed(*k))
    }

    /// Raw bitmask, bit `n` is key `n`.
    #[inline(always)]
    pub fn bits(&self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut keys = Keypad::default();

        keys.set(KeyCode::Key0, true);
        assert_eq!(keys.bits(), 0b00000000_00000001);
        assert!(keys.is_pressed(KeyCode::Key0));
        assert!(!keys.is_pressed(KeyCode::Key1));
        assert!(!keys.is_pressed(KeyCode::Key7));

        keys.set(KeyCode::Key7, true);
        assert_eq!(keys.bits(), 0b00000000_10000001);

        keys.set(KeyCode::Key0, false);
        assert_eq!(keys.bits(), 0b00000000_10000000);
        assert!(!keys.is_pressed(KeyCode::Key0));
        assert!(keys.is_pressed(KeyCode::Key7));

        keys.set(KeyCode::KeyF, true);
        assert_eq!(keys.bits(), 0b10000000_10000000);
        assert!(keys.is_pressed(KeyCode::KeyF));
    }

    #[test]
    fn test_first_pressed_is_lowest() {
        let mut keys = Keypad::default();
        assert_eq!(keys.first_pressed(), None);

        keys.set(KeyCode::KeyC, true);
        keys.set(KeyCode::Key3, true);
        assert_eq!(keys.first_pressed(), Some(KeyCode::Key3));
        assert_eq!(
            keys.iter_pressed().collect::<Vec<_>>(),
            vec![KeyCode::Key3, KeyCode::KeyC]
        );

        keys.clear();
        assert!(!keys.any());
    }

    #[test]
    fn test_keycode_range() {
        for k in 0..KEY_COUNT {
            assert_eq!(KeyCode::try_from(k).map(u8::from), Ok(k));
        }
        assert_eq!(KeyCode::try_from(16), Err(InvalidKeyCode(16)));
        assert_eq!(KeyCode::KeyA.to_string(), "ka");
    }
}
