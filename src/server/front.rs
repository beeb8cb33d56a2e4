//! Public-facing accept loop that enforces the idle timeout.
//!
//! tiny_http owns its accept loop and gives up on the first accept error, so
//! a read timeout can't be set on its listening socket. Clients connect here
//! instead: every accepted stream gets read and write timeouts and is piped
//! to the in-process tiny_http listener.
//!
//! ```text
//! client ──▶ front (backlog 100, idle timeout) ──pipe──▶ tiny_http (127.0.0.1:0)
//! ```

use crate::debug;
use parking_lot::Mutex;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const BUFFER_SIZE: usize = 16 * 1024;

/// Pause after a failed accept (out of file descriptors, usually).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Running front accept loop.
pub struct Front {
    addr: SocketAddr,
    closed: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Front {
    /// Start accepting on `listener`, piping each client to `upstream`.
    pub fn spawn(listener: TcpListener, upstream: SocketAddr, idle: Duration) -> io::Result<Self> {
        let addr = listener.local_addr()?;
        let closed = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&closed);
        let thread = thread::Builder::new()
            .name("mediasrv-accept".into())
            .spawn(move || accept_loop(&listener, upstream, idle, &flag))?;

        Ok(Self {
            addr,
            closed,
            thread,
        })
    }

    /// Stop accepting. Connections already piped run until they end or idle out.
    pub fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
        // Wake the blocking accept; without it the join below never returns
        if TcpStream::connect(self.addr).is_ok() && self.thread.join().is_err() {
            debug!("serve"; "accept thread panicked");
        }
    }
}

fn accept_loop(listener: &TcpListener, upstream: SocketAddr, idle: Duration, closed: &AtomicBool) {
    for stream in listener.incoming() {
        if closed.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(client) => {
                if let Err(e) = pipe(client, upstream, idle) {
                    debug!("serve"; "dropped connection: {}", e);
                }
            }
            Err(e) => {
                debug!("serve"; "accept failed: {}", e);
                thread::sleep(ACCEPT_BACKOFF);
            }
        }
    }
}

/// Time of the last byte moved in either direction.
struct Activity(Mutex<Instant>);

impl Activity {
    fn touch(&self) {
        *self.0.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.0.lock().elapsed()
    }
}

/// Connect `client` to `upstream` with one thread per direction.
fn pipe(client: TcpStream, upstream: SocketAddr, idle: Duration) -> io::Result<()> {
    client.set_read_timeout(Some(idle))?;
    client.set_write_timeout(Some(idle))?;
    let server = TcpStream::connect(upstream)?;

    let activity = Arc::new(Activity(Mutex::new(Instant::now())));
    let (client_out, server_in) = (client.try_clone()?, server.try_clone()?);

    let downstream_activity = Arc::clone(&activity);
    thread::Builder::new()
        .name("mediasrv-pipe".into())
        .spawn(move || downstream(server_in, client_out, &downstream_activity))?;
    thread::Builder::new()
        .name("mediasrv-pipe".into())
        .spawn(move || upstream_pipe(client, server, &activity, idle))?;
    Ok(())
}

/// Client to tiny_http. Owns the idle check.
fn upstream_pipe(mut client: TcpStream, mut server: TcpStream, activity: &Activity, idle: Duration) {
    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        match client.read(&mut buf) {
            Ok(0) => {
                // Client is done sending; let the response finish
                let _ = server.shutdown(Shutdown::Write);
                return;
            }
            Ok(n) => {
                if server.write_all(&buf[..n]).is_err() {
                    break;
                }
                activity.touch();
            }
            Err(e) if is_timeout(&e) => {
                if activity.idle_for() >= idle {
                    debug!("serve"; "closing idle connection from {}", peer(&client));
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
    let _ = client.shutdown(Shutdown::Both);
    let _ = server.shutdown(Shutdown::Both);
}

/// tiny_http to client. A client that stops reading hits the write timeout.
fn downstream(mut server: TcpStream, mut client: TcpStream, activity: &Activity) {
    let mut buf = [0u8; BUFFER_SIZE];
    loop {
        match server.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if client.write_all(&buf[..n]).is_err() {
                    break;
                }
                activity.touch();
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
    let _ = client.shutdown(Shutdown::Write);
    let _ = server.shutdown(Shutdown::Both);
}

/// Read timeouts surface as `WouldBlock` on Unix and `TimedOut` on Windows.
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn peer(stream: &TcpStream) -> String {
    stream
        .peer_addr()
        .map_or_else(|_| "-".to_string(), |addr| addr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echo server standing in for tiny_http.
    fn echo_upstream() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                thread::spawn(move || {
                    let mut reader = stream.try_clone().unwrap();
                    let _ = io::copy(&mut reader, &mut stream);
                });
            }
        });
        addr
    }

    fn front(idle: Duration) -> Front {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        Front::spawn(listener, echo_upstream(), idle).unwrap()
    }

    #[test]
    fn test_bytes_pass_through() {
        let front = front(Duration::from_secs(5));
        let mut client = TcpStream::connect(front.addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        client.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        front.close();
    }

    #[test]
    fn test_quiet_client_is_disconnected() {
        let front = front(Duration::from_millis(200));
        let mut client = TcpStream::connect(front.addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        let started = Instant::now();
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_activity_keeps_connection_open() {
        let front = front(Duration::from_millis(300));
        let mut client = TcpStream::connect(front.addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

        // Total time well past the timeout, but never idle that long
        for _ in 0..6 {
            thread::sleep(Duration::from_millis(100));
            client.write_all(b"x").unwrap();
            let mut byte = [0u8; 1];
            client.read_exact(&mut byte).unwrap();
        }
    }

    #[test]
    fn test_close_stops_accepting() {
        let front = front(Duration::from_secs(5));
        let addr = front.addr;
        front.close();

        // The listener is dropped with the accept thread
        assert!(TcpStream::connect(addr).is_err());
    }
}
