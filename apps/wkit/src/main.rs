// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::Parser;
use wirekit_cli::{cli, logging};

fn main() {
    let cli = cli::Cli::parse();
    let code = cli::handle_command(&cli, logging::init_logging);
    if code != 0 {
        std::process::exit(code);
    }
}
