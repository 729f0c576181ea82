//! Special key codepoints for `send_keys`
//!
//! WebDriver reserves part of the Unicode private use area for non-printing
//! keys; these are the ones the suite types.

pub const BACKSPACE: &str = "\u{E003}";
pub const TAB: &str = "\u{E004}";
pub const ENTER: &str = "\u{E007}";
pub const ESCAPE: &str = "\u{E00C}";
pub const END: &str = "\u{E010}";
pub const HOME: &str = "\u{E011}";
