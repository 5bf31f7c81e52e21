pub mod check;
pub mod host;
pub mod token;
