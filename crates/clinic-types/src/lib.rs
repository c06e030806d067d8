mod appointment;
mod datetime;
mod people;

pub use appointment::*;
pub use people::*;
