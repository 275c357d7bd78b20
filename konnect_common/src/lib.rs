mod money;

pub mod helpers;
pub mod op;
mod secret;

pub use money::{Rupees, RupeesConversionError};
pub use secret::Secret;
