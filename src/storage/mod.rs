//! Local persistence.
//!
//! - [`JsonFileStorage`]: the known-contacts JSON file
//! - [`KeychainAccess`]: OS keychain for mailbox passwords and API keys

mod contacts_file;
mod keychain;

pub use contacts_file::JsonFileStorage;
pub use keychain::{Credential, KeychainAccess, KeychainError};
