// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

// Allowed: This is a CLI code generation tool, not server code.
#![allow(clippy::disallowed_macros)]

use std::fs;
use std::path::{Path, PathBuf};
use ts_rs::TS;
use wirekit_api::{diagram, pinout, summary};
use wirekit_core::catalog::ConnectionLegend;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let declarations = vec![
        // wirekit-core types
        format!("// wirekit-core\nexport {}", wirekit_core::PlugType::decl()),
        format!("export {}", wirekit_core::PinColor::decl()),
        format!("export {}", wirekit_core::DeviceId::decl()),
        format!("export {}", wirekit_core::WireMode::decl()),
        format!("export {}", wirekit_core::SelectorKind::decl()),
        format!("export {}", wirekit_core::DeviceRecord::decl()),
        format!("export {}", wirekit_core::DevicePatch::decl()),
        format!("export {}", wirekit_core::PinUsage::decl()),
        format!("export {}", wirekit_core::Conflict::decl()),
        format!("export {}", wirekit_core::PowerShare::decl()),
        format!("export {}", wirekit_core::ConflictReport::decl()),
        // catalog
        format!("export {}", wirekit_core::PinRole::decl()),
        format!("export {}", wirekit_core::PinDescriptor::decl()),
        format!("export {}", ConnectionLegend::decl()),
        format!("export {}", wirekit_core::DeviceInfo::decl()),
        format!("export {}", wirekit_core::DeviceTypeDescriptor::decl()),
        format!("export {}", wirekit_core::PlugDescriptor::decl()),
        format!("export {}", wirekit_core::SelectorSlot::decl()),
        format!("export {}", wirekit_core::DeviceTemplate::decl()),
        format!("export {}", wirekit_core::Catalog::decl()),
        // wirekit-api types
        format!("\n// wirekit-api\nexport {}", wirekit_api::MessageType::decl()),
        format!("export {}", wirekit_api::RequestPayload::decl()),
        format!("export {}", wirekit_api::ResponsePayload::decl()),
        format!("export {}", wirekit_api::PinUsageView::decl()),
        format!("export {}", summary::PinSummaryEntry::decl()),
        format!("export {}", summary::PlugSummary::decl()),
        format!("export {}", summary::PinSummary::decl()),
        format!("export {}", pinout::PinoutRow::decl()),
        format!("export {}", pinout::PinoutSection::decl()),
        format!("export {}", pinout::PinoutView::decl()),
        format!("export {}", diagram::Position::decl()),
        format!("export {}", diagram::NodeKind::decl()),
        format!("export {}", diagram::Handle::decl()),
        format!("export {}", diagram::Terminal::decl()),
        format!("export {}", diagram::DiagramNode::decl()),
        format!("export {}", diagram::DiagramEdge::decl()),
        format!("export {}", diagram::Diagram::decl()),
    ];

    let output = declarations.join("\n\n");
    let content = format!("// This file is auto-generated. Do not edit it manually.\n\n{output}\n");

    let output_path = match std::env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
            let workspace_root = manifest_dir
                .parent()
                .and_then(|parent| parent.parent())
                .ok_or("Failed to find workspace root from CARGO_MANIFEST_DIR")?;
            workspace_root.join("bindings/wirekit-types.ts")
        },
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    println!("Writing TypeScript bindings to: {}", output_path.display());

    fs::write(&output_path, content)?;

    println!("✅ TypeScript bindings generated successfully.");

    Ok(())
}
