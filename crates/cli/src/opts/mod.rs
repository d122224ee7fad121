mod global;
mod wallet;

pub use global::*;
pub use wallet::*;
