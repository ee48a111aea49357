//! Configuration: environment-driven settings plus fixed constants
//! (page sizes, email domain, reporting windows).

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
