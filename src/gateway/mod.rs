//! Gateway construction and the request pipeline

mod builder;
mod instance;

pub use builder::{Switchyard, SwitchyardBuilder};
pub use instance::Gateway;
