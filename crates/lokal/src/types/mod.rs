mod color;
mod interner;
mod key;
mod value;

pub use color::{ColorCode, palette_hex};
pub use key::{Key, KeyError};
pub use value::Value;
