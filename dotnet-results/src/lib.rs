// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub mod command;
pub mod config;
pub mod process;
pub mod project;
pub mod report;
pub mod run;
pub mod store;

pub use config::Config;
pub use store::{ResultStore, StoreEvent};
