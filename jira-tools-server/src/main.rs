//! Jira Tools Server - Jira issue and project operations over MCP
//!
//! Serves the tools on STDIO. Connection settings come from `JIRA_URL` and
//! `JIRA_PERSONAL_ACCESS_TOKEN` (or a `.env` file).

use jira_tools_server::JiraToolsServer;
use pulseengine_mcp_server::McpServerBuilder;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the protocol
    JiraToolsServer::configure_stdio_logging();

    info!("Starting Jira Tools Server...");

    let jira_server = match JiraToolsServer::new().await {
        Ok(server) => {
            info!("Jira Tools Server created successfully");
            server
        }
        Err(e) => {
            error!("Failed to create Jira Tools Server: {}", e);
            eprintln!("❌ Failed to start Jira Tools Server: {}", e);
            eprintln!("\nPlease check:");
            eprintln!("  - JIRA_URL environment variable is set");
            eprintln!("  - JIRA_PERSONAL_ACCESS_TOKEN (or JIRA_AUTH_TYPE and its credentials) is set");
            eprintln!("  - JIRA instance is accessible");
            std::process::exit(1);
        }
    };

    info!("Starting MCP server with STDIO transport...");

    let mut server = jira_server.serve_stdio().await?;

    info!("🚀 Jira Tools Server is running and ready to serve requests");

    server.run().await?;

    Ok(())
}
