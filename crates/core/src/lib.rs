#![forbid(unsafe_code)]

pub mod badge;
pub mod catalog;
pub mod error;
pub mod gatekeeper;
pub mod ledger;
pub mod model;
pub mod scoring;
pub mod time;
pub mod validator;

pub use error::Error;
pub use time::Clock;
