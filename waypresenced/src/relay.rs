//! Newline-delimited JSON transport for the real-time channel
use std::io::{self, BufRead, Write};

use tracing::{debug, trace, warn};
use waypresence_api::{InboundMessage, OutboundMessage};

use crate::task::AutoJoinHandle;
use crate::SessionCtrl;

/// Feed every message read from `reader` into the session, until EOF
///
/// Lines that do not parse (including ones that are not UTF-8) are logged
/// and skipped.
pub fn read_inbound<R>(mut reader: R, ctrl: &SessionCtrl) -> io::Result<()>
where
    R: BufRead,
{
    let mut buf = vec![];
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let msg: InboundMessage = match serde_json::from_slice(line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(
                    error = %e,
                    line = %String::from_utf8_lossy(line),
                    "Ignoring invalid inbound message"
                );
                continue;
            }
        };
        trace!(?msg, "Inbound");

        if ctrl.send(msg).is_err() {
            debug!("Session closed, no longer reading input");
            break;
        }
    }
    Ok(())
}

/// Write every outbound message as a JSON line, until the session is gone
pub fn write_outbound<W>(rx: flume::Receiver<OutboundMessage>, mut writer: W) -> io::Result<()>
where
    W: Write,
{
    for msg in rx.iter() {
        serde_json::to_writer(&mut writer, &msg)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(())
}

/// Run [`write_outbound`] on its own thread
///
/// The returned handle joins the thread when dropped, logging a panic if there was one.
pub fn spawn_outbound_writer<W>(
    rx: flume::Receiver<OutboundMessage>,
    writer: W,
) -> io::Result<AutoJoinHandle>
where
    W: Write + Send + 'static,
{
    AutoJoinHandle::spawn("outbound-writer", move || {
        if let Err(e) = write_outbound(rx, writer) {
            warn!(error = %e, "Could not write to the channel");
        }
    })
}
