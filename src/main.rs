mod config;
mod export;
mod import;
mod ipc;
mod leaderboard;
mod model;
mod roster;
mod seed;
mod settings;
mod stats;
mod store;

use std::io::{self, BufRead, Write};

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the protocol, so logs go to stderr.
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn open_configured_store(cfg: &config::Config) -> Box<dyn store::Store> {
    match store::open_store(cfg.backend, &cfg.db_path, cfg.seed) {
        Ok(s) => s,
        Err(e) => {
            warn!(
                backend = cfg.backend.as_str(),
                path = %cfg.db_path.display(),
                "failed to open store, serving from memory: {e:?}"
            );
            let mut fallback: Box<dyn store::Store> = Box::new(store::MemoryStore::new());
            if cfg.seed {
                if let Err(e) = seed::seed_demo_data(fallback.as_mut()) {
                    warn!("failed to seed fallback store: {e:?}");
                }
            }
            fallback
        }
    }
}

fn write_line(stdout: &mut impl Write, value: &serde_json::Value) -> io::Result<()> {
    let line = serde_json::to_string(value).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    writeln!(stdout, "{}", line)
}

fn main() {
    init_tracing();

    let cfg = config::Config::load();
    let store = open_configured_store(&cfg);
    info!(backend = store.backend().as_str(), "deptd ready");
    let mut state = ipc::AppState::new(&cfg, store);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                let _ = write_line(&mut stdout, &ipc::bad_json(e.to_string()));
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        for event in state.drain_events() {
            let _ = write_line(&mut stdout, &event);
        }
        if write_line(&mut stdout, &resp).is_err() {
            break;
        }
        let _ = stdout.flush();
    }
}
