pub mod config;
pub mod declare;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod from_value;
pub mod value;

pub use datacast_api_derive::Model;
