use std::io;
use std::net::{Ipv4Addr, TcpListener};

use tracing::debug;

use crate::error::{LockError, LockResult};
use crate::identity::LockIdentity;
use crate::traits::Locker;

/// Lock held by listening on a TCP port on `127.0.0.1`.
///
/// The kernel lets exactly one socket listen on an address, so a successful
/// bind is proof of exclusive ownership across every process on the host.
/// Releasing closes the listener. Cooperating processes agree on the port
/// out of band.
#[derive(Debug)]
pub struct PortLocker {
    port: u16,
    listener: Option<TcpListener>,
}

impl PortLocker {
    /// Create an unheld locker for `port`.
    ///
    /// Port `0` asks the OS for any free port; see [`bound_port`](Self::bound_port).
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
        }
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The port actually bound, while held.
    pub fn bound_port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|addr| addr.port())
    }
}

impl Locker for PortLocker {
    fn acquire(&mut self) -> LockResult<()> {
        if self.listener.is_some() {
            return Ok(());
        }
        match TcpListener::bind((Ipv4Addr::LOCALHOST, self.port)) {
            Ok(listener) => {
                debug!(port = self.port, "port lock acquired");
                self.listener = Some(listener);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(LockError::PortInUse {
                port: self.port,
                source: e,
            }),
            Err(e) => Err(LockError::Io(e)),
        }
    }

    fn release(&mut self) {
        if self.listener.take().is_some() {
            debug!(port = self.port, "port lock released");
        }
    }

    fn is_held(&self) -> bool {
        self.listener.is_some()
    }

    fn identity(&self) -> LockIdentity {
        LockIdentity::Port(self.port)
    }
}
