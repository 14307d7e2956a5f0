#![deny(warnings)]
#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
extern crate serde_derive;

pub use config::Config;
pub use error::{Error, Result};
pub use lookup::{account_by_id, account_by_name, group_by_id, group_by_name};
pub use record::{AccountEntry, GroupEntry};

pub mod config;
mod error;
mod lookup;
#[cfg(target_os = "linux")]
pub mod nss;
pub mod record;
pub mod slot;
