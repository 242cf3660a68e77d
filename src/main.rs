//! Entry point for the **smallwm** window manager.
//!
//! Connects to the X server, adopts the windows that are already mapped and
//! then feeds every windowing-system event to the
//! [`ClientManager`](smallwm::manager::ClientManager) on the main thread.

use log::{error, info};
use smallwm::config::Config;
use smallwm::manager::ClientManager;
use smallwm::traits::EventSource;
use smallwm::x11::backend::X11Backend;

/// Resolve the config directory (`$XDG_CONFIG_HOME/smallwm`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("smallwm")
}

/// Try to load the config from `$XDG_CONFIG_HOME/smallwm/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();

    let backend = match X11Backend::connect(None) {
        Ok(b) => b,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let existing = backend.existing_windows().unwrap_or_else(|e| {
        error!("failed to list existing windows: {}", e);
        Vec::new()
    });

    let mut manager = ClientManager::new(backend, &config);
    for window in existing {
        if let Err(e) = manager.create(window) {
            error!("cannot manage existing window {}: {}", window, e);
        }
    }
    info!("managing {} existing window(s)", manager.registry().len());

    run_event_loop(&mut manager);
}

//  Event loop

fn run_event_loop(manager: &mut ClientManager<X11Backend>) {
    info!("smallwm running");
    loop {
        let event = match manager.backend().next_event() {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(e) => {
                error!("event source error: {}", e);
                break;
            }
        };
        if let Err(e) = manager.handle(event) {
            error!("event error: {}", e);
        }
    }
    info!("event source closed, exiting");
}
