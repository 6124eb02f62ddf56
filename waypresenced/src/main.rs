#![deny(clippy::as_conversions)]
use opts::Opts;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypresence::http::HttpNotifier;
use waypresence::notify::LogNotifier;
use waypresence::store::FileStore;
use waypresenced::{Parameters, Session, SharedNotifier};

mod opts;

fn main() -> anyhow::Result<()> {
    init_logging();

    let opts = Opts::from_args();

    let waypoints = waypresenced::load_waypoints(opts.waypoints.as_deref())?;
    let store = FileStore::open_in(&opts.data_dir)?;
    info!(store = %store.path().display(), "Opened presence store");

    let rt = tokio::runtime::Runtime::new()?;
    let http_notifier = opts
        .endpoint
        .clone()
        .map(|endpoint| Arc::new(HttpNotifier::new(endpoint, rt.handle().clone())));
    let notifier: SharedNotifier = match http_notifier.clone() {
        Some(http_notifier) => {
            info!(endpoint = %http_notifier.endpoint(), "Posting presence notifications");
            http_notifier
        }
        None => Arc::new(LogNotifier),
    };

    let params = Parameters::builder()
        .waypoints(waypoints)
        .tracked_peer(opts.peer_id())
        .build();

    let mut session = Session::new(params, Box::new(store), notifier)?;
    let ctrl = session.get_ctrl();
    ctrl.install_signal_handler()?;

    let outbound_rx = session
        .take_outbound()
        .ok_or_else(|| anyhow::format_err!("outbound channel already taken"))?;
    let writer = waypresenced::spawn_outbound_writer(outbound_rx, io::stdout())?;

    // Not joined: stays blocked on stdin if we exit on a signal
    thread::spawn(move || {
        if let Err(e) = waypresenced::read_inbound(io::stdin().lock(), &ctrl) {
            warn!(error = %e, "Could not read from the channel");
        }
        ctrl.stop();
    });

    session.wait();
    // the writer finishes once the session drops its end of the channel
    drop(writer);

    if let Some(http_notifier) = http_notifier {
        http_notifier.drain(opts.flush_grace);
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stderr))
                .with_writer(io::stderr),
        )
        .init();
}
