use std::ffi::CString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ledge_wm::actor::{self, reactor};
use ledge_wm::common::config::Config;
use ledge_wm::common::log::init_logging;
use ledge_wm::model::ScreenLayout;
use ledge_wm::sys::x11::Display;
use reactor::{Event, Exit, Reactor};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ledge")]
#[command(about = "A small stacking window manager for X11")]
struct Cli {
    /// Configuration file [default: $XDG_CONFIG_HOME/ledge/ledge.toml]
    #[arg(long)]
    config: Option<PathBuf>,
    /// X display to manage [default: $DISPLAY]
    #[arg(long)]
    display: Option<String>,
    /// Print the effective configuration and exit
    #[arg(long)]
    check_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = Config::load(cli.config.as_deref());
    if cli.check_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let display = Display::open(cli.display.as_deref(), &config.settings.decoration)
        .context("failed to start managing the display")?;
    let (root, monitors) = display.query_screen().context("failed to query monitors")?;
    let layout = ScreenLayout::new(root, monitors.clone());

    let (events_tx, events_rx) = actor::channel();
    events_tx.send(Event::ScreenChanged { root, monitors });
    for event in display.scan().context("failed to scan existing windows")? {
        events_tx.send(event);
    }
    display.spawn_reader(events_tx.clone()).context("failed to start the event reader")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let exit = runtime.block_on(async {
        forward_signals(events_tx).context("failed to install signal handlers")?;
        let reactor = Reactor::new(config, layout, display.server());
        reactor.run(events_rx).await.context("window manager stopped")
    });

    match exit {
        Ok(Exit::Restart) => restart(),
        Ok(Exit::Disconnected) => {
            info!("event sources closed, exiting");
            Ok(())
        }
        Err(e) => {
            error!("{e:#}");
            Err(e)
        }
    }
}

fn forward_signals(events: reactor::Sender) -> std::io::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut dump = signal(SignalKind::user_defined1())?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(()) = hangup.recv() => {
                    info!("SIGHUP received");
                    events.send(Event::Restart);
                }
                Some(()) = dump.recv() => events.send(Event::DumpState),
                else => break,
            }
        }
    });
    Ok(())
}

/// Replaces this process with a fresh copy of itself, with the same arguments.
fn restart() -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let path = CString::new(exe.into_os_string().into_vec())?;
    let args = std::env::args_os()
        .map(|arg| CString::new(arg.into_vec()))
        .collect::<Result<Vec<_>, _>>()?;
    info!(exe = ?path, "restarting");
    match nix::unistd::execv(&path, &args) {
        Ok(never) => match never {},
        Err(e) => Err(e).context("failed to re-exec"),
    }
}
