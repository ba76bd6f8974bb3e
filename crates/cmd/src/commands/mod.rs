// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod init_config;
pub mod serve;

pub use init_config::init_config_command;
pub use serve::{ServeArgs, serve_command};
