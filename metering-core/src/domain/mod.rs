pub mod month;
pub mod profile;
pub mod reading;
pub mod validate;

pub use month::Month;
pub use profile::{Fraction, Profile, ProfileBuilder, ProfileError};
pub use reading::{Connection, MeterReading, MeterRecord, RawReading};
pub use validate::{validate_connection, ValidationFailure};
