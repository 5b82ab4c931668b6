pub mod db;
pub mod domain;

pub use domain::{
    Connection, Fraction, MeterReading, MeterRecord, Month, Profile, ProfileBuilder,
    ProfileError, RawReading, ValidationFailure,
};
