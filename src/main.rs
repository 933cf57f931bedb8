//! blinkpluscharge - reminder engine and settings console

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use blinkpluscharge::autostart::{RunKeyEntry, StartupEntry};
use blinkpluscharge::config::{self, AppConfig, Args, Command};
use blinkpluscharge::console::SettingsController;
use blinkpluscharge::engine::ReminderEngine;
use blinkpluscharge::instance::{BackgroundInstance, InstanceLock, LOCK_FILE};
use blinkpluscharge::power;
use blinkpluscharge::settings::{PreferenceRecord, SettingsStore};
use blinkpluscharge::sound::SoundNotifier;
use blinkpluscharge::ReminderError;

fn main() -> Result<()> {
    let args = Args::parse_from_env();

    let app_config = match AppConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}", e);
            AppConfig::default()
        }
    };

    if args.background {
        init_background_logging(&args, &app_config);
        run_background(&args)
    } else {
        init_logging(&args)?;
        run_console(args)
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(log_file) = &args.log {
        let file = std::fs::File::create(log_file)
            .with_context(|| format!("Failed to create log file '{}'", log_file))?;
        subscriber.with_writer(file).with_ansi(false).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Background mode has no console: log to a file, stderr with `--debug`, or nowhere
fn init_background_logging(args: &Args, app_config: &AppConfig) {
    use tracing_subscriber::{fmt, prelude::*};

    let level = if args.verbose > 0 || args.quiet {
        args.log_level().to_string()
    } else {
        app_config.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let log_file = args
        .log
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| app_config.log_file_path());

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path);

        match file {
            Ok(file) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(file).with_ansi(false))
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Failed to open log file: {}", e);
            }
        }
    }

    if args.debug {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::sink))
            .init();
    }
}

/// Run the reminder engine until terminated
fn run_background(args: &Args) -> Result<()> {
    #[cfg(windows)]
    {
        if !args.debug {
            // Started from a console: detach so no window lingers
            let _ = unsafe { windows::Win32::System::Console::FreeConsole() };
        }
    }
    #[cfg(not(windows))]
    let _ = args;

    info!("blinkpluscharge {} starting in background", blinkpluscharge::VERSION);

    let store = SettingsStore::at_default_location();
    let record = store.load();

    match RunKeyEntry::for_current_exe() {
        Ok(entry) => entry.set_auto_start(record.auto_start),
        Err(e) => warn!("Cannot determine startup command: {}", e),
    }

    let _lock = match InstanceLock::acquire(config::data_dir().join(LOCK_FILE)) {
        Ok(lock) => lock,
        Err(ReminderError::AlreadyRunning(pid)) => {
            info!("Background instance already running (pid {}), exiting", pid);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to acquire instance lock"),
    };

    let power: Arc<dyn power::PowerSource> = Arc::from(power::system_power());
    let notifier = Arc::new(SoundNotifier::system());
    let mut engine = ReminderEngine::new(store, power, notifier);

    let running = Arc::new(AtomicBool::new(true));

    #[cfg(windows)]
    {
        let r = running.clone();
        let _ = ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        });
    }

    if let Err(e) = engine.start() {
        error!("Failed to start reminder engine: {}", e);
        return Err(e.into());
    }

    while running.load(Ordering::SeqCst) && engine.is_running() {
        std::thread::sleep(Duration::from_millis(100));
    }

    engine.stop();
    info!("Background instance exiting");
    Ok(())
}

fn build_controller() -> Result<SettingsController> {
    let store = SettingsStore::at_default_location();
    let startup = RunKeyEntry::for_current_exe()?;
    let background = BackgroundInstance::for_current_exe(&config::data_dir())?;

    Ok(SettingsController::new(
        store,
        Box::new(startup),
        Box::new(background),
        SoundNotifier::system(),
    ))
}

/// Foreground settings console
fn run_console(args: Args) -> Result<()> {
    let controller = build_controller()?;

    match args.command.unwrap_or_default() {
        Command::Show => cmd_show(&controller),
        Command::Set(set) => {
            let mut record = controller.current();
            set.apply(&mut record);
            save(&controller, &record)
        }
        Command::Defaults => {
            controller.reset_defaults()?;
            println!("Settings reset to defaults.");
            Ok(())
        }
        Command::Preview {
            channel,
            file,
            wait,
        } => cmd_preview(&controller, channel, file.as_deref(), wait),
        Command::Kill => {
            if controller.kill_background() {
                println!("Background instance stopped.");
            } else {
                println!("No background instance running.");
            }
            Ok(())
        }
        Command::EndAutorun => {
            controller.end_autorun()?;
            println!("Autostart removed.");
            Ok(())
        }
    }
}

fn save(controller: &SettingsController, record: &PreferenceRecord) -> Result<()> {
    controller.save(record)?;
    println!("Settings saved to {}", controller.store().path().display());
    println!("Background instance restarted.");
    Ok(())
}

/// Print current settings and background status
fn cmd_show(controller: &SettingsController) -> Result<()> {
    let record = controller.current();

    println!("Settings file: {}\n", controller.store().path().display());
    print!(
        "{}",
        toml::to_string_pretty(&record).context("Failed to format settings")?
    );
    println!();
    let autostart = if controller.autostart_registered() {
        "present"
    } else {
        "absent"
    };
    let background = if controller.background_running() {
        "running"
    } else {
        "stopped"
    };
    println!("  Autostart entry:  {}", autostart);
    println!("  Background:       {}", background);

    Ok(())
}

fn cmd_preview(
    controller: &SettingsController,
    channel: blinkpluscharge::settings::Channel,
    file: Option<&Path>,
    wait_secs: u64,
) -> Result<()> {
    println!("Playing {} sound...", channel);
    controller.preview(channel, file);

    // Playback is asynchronous; keep the handle open while it plays
    std::thread::sleep(Duration::from_secs(wait_secs));
    controller.close_sounds();
    Ok(())
}
