#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod block;
mod checksum;
mod flagop;
mod flags;
mod format;
mod letter;
mod macros;
mod nibble;
mod parse;
mod password;
mod scene;

pub use self::block::*;
pub use self::checksum::*;
pub use self::flagop::*;
pub use self::flags::*;
pub use self::format::*;
pub use self::letter::*;
pub use self::nibble::*;
pub use self::parse::*;
pub use self::password::*;
pub use self::scene::*;
