#![windows_subsystem = "windows"]
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use intellitranslate_core::config::TranslatorConfig;
use intellitranslate_core::protocol::Server;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("intellitranslate_core=info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut server = match Server::new(TranslatorConfig::default()) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start translation core");
            std::process::exit(1);
        }
    };

    info!("intellitranslate-core ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| server.handle(&line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => {
                error!("request handler panicked");
                serde_json::json!({
                    "status": "error",
                    "message": "internal core error"
                })
                .to_string()
            }
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
