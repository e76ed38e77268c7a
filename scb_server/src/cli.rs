use std::{env, env::VarError};

/// The server takes no real CLI. Any argument at all (`--help`, typically) prints the route and
/// environment-variable reference; the caller decides whether to exit.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        print_help();
        print_current_env();
    }
    has_cli_args
}

fn print_help() {
    const HELP: &str = include_str!("./cli-help.txt");
    println!("\n{HELP}\n");
}

fn print_current_env() {
    // A fixed whitelist rather than a prefix scan. Secrets never go in this list.
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "SCB_HOST",
        "SCB_PORT",
        "SCB_STOREFRONT_BASE_URL",
        "SCB_WEBHOOK_TOLERANCE_SECS",
        "SCB_IDEMPOTENCY_TTL_SECS",
        "SCB_STRIPE_API_BASE",
        "SCB_STRIPE_TIMEOUT_SECS",
        "SCB_SHOPIFY_SHOP",
        "SCB_SHOPIFY_API_VERSION",
        "SCB_SHOPIFY_TIMEOUT_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
