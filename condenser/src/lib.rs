pub mod batch;
pub mod cfg;
pub mod condense;
pub mod crypto;
pub mod error;
pub mod exec;
pub mod gas;
pub mod inspector;
pub mod ledger;
pub mod state;
pub mod transaction;
pub mod vin;
