// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod audit;
pub mod authz;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod models;
pub mod split;
pub mod utils;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
