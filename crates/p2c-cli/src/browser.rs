//! Browser command implementation for p2c.
//!
//! Starts the HTTP gateway.

use p2c_core::{GatewayConfig, ProcessBridge};

use crate::colors;

/// Run the HTTP gateway until interrupted.
pub async fn execute(config: &GatewayConfig, bridge: ProcessBridge) -> anyhow::Result<()> {
    println!(
        "\n{}p2c Gateway{} - Pascal-S to C over HTTP",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Compiler:{} {}",
        colors::CYAN,
        colors::RESET,
        bridge.program().display()
    );
    println!(
        "{}  ◆ Endpoint:{} http://{}/compile",
        colors::CYAN,
        colors::RESET,
        config.bind_addr()
    );
    println!(
        "{}  ◆ Origin:{} {}",
        colors::CYAN,
        colors::RESET,
        config.allowed_origin
    );
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::GREEN, colors::RESET);
    println!();

    p2c_server::serve(config, bridge).await?;

    Ok(())
}
