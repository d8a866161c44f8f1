pub mod clock;
pub mod japanese;
pub mod number_util;
