// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod render;
pub mod rpc;
pub mod shell;

pub use config::Config;
