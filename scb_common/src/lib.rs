mod money;
mod secret;

pub use money::{MinorUnits, MinorUnitsConversionError};
pub use secret::Secret;
