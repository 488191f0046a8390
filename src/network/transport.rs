//! Transport
//!
//! One request/response exchange per connection, as the relay module expects.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::protocol::{format_hex, read_frame, write_frame, RawFrame};

/// Carries a single frame to the module and optionally brings one back
///
/// Each call owns its connection from open to close; nothing is kept
/// between calls. Retrying is the caller's job.
pub trait Transport {
    fn exchange(&mut self, request: &RawFrame, expect_response: bool) -> Result<Option<RawFrame>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&mut self, request: &RawFrame, expect_response: bool) -> Result<Option<RawFrame>> {
        (**self).exchange(request, expect_response)
    }
}

/// Progress of a single exchange
///
/// The socket lives inside `AwaitingResponse`, so leaving that state by any
/// edge (response, timeout, error) closes it.
enum Exchange {
    Idle,
    Connecting,
    AwaitingResponse(TcpStream),
    Done(Option<RawFrame>),
    Failed(RelayError),
}

impl Exchange {
    fn name(&self) -> &'static str {
        match self {
            Exchange::Idle => "idle",
            Exchange::Connecting => "connecting",
            Exchange::AwaitingResponse(_) => "awaiting-response",
            Exchange::Done(_) => "done",
            Exchange::Failed(_) => "failed",
        }
    }
}

/// TCP transport opening a fresh connection for every exchange
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    /// Create a transport targeting the configured module
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            timeout: config.timeout(),
        }
    }

    /// Per-attempt timeout applied to connect, read and write
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Advance the exchange by one transition
    fn step(&self, state: Exchange, request: &RawFrame, expect_response: bool) -> Exchange {
        match state {
            Exchange::Idle => Exchange::Connecting,
            Exchange::Connecting => match self.connect_and_send(request) {
                Ok(stream) if expect_response => Exchange::AwaitingResponse(stream),
                Ok(_) => Exchange::Done(None),
                Err(e) => Exchange::Failed(e),
            },
            Exchange::AwaitingResponse(mut stream) => match read_frame(&mut stream) {
                Ok(raw) => {
                    tracing::trace!(
                        "Received [{}] from {}:{}",
                        format_hex(&raw),
                        self.host,
                        self.port
                    );
                    Exchange::Done(Some(raw))
                }
                Err(e) => Exchange::Failed(self.classify(e)),
            },
            terminal => terminal,
        }
    }

    fn connect_and_send(&self, request: &RawFrame) -> Result<TcpStream> {
        let mut stream = self.connect()?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        tracing::trace!("Sending [{}] to {}:{}", format_hex(request), self.host, self.port);
        write_frame(&mut stream, request).map_err(|e| self.classify(e))?;
        Ok(stream)
    }

    fn connect(&self) -> Result<TcpStream> {
        let mut last_error = None;

        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => RelayError::from_socket(e, self.timeout),
            None => RelayError::Config(format!(
                "{}:{} did not resolve to any address",
                self.host, self.port
            )),
        })
    }

    fn classify(&self, err: RelayError) -> RelayError {
        match err {
            RelayError::Io(e) => RelayError::from_socket(e, self.timeout),
            other => other,
        }
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, request: &RawFrame, expect_response: bool) -> Result<Option<RawFrame>> {
        let mut state = Exchange::Idle;

        loop {
            let from = state.name();
            state = self.step(state, request, expect_response);
            tracing::trace!("Exchange {} -> {}", from, state.name());

            match state {
                Exchange::Done(response) => return Ok(response),
                Exchange::Failed(err) => return Err(err),
                next => state = next,
            }
        }
    }
}
