//! Session Module
//!
//! Client-side model of one relay module.
//!
//! ## Responsibilities
//! - Build request frames and push them through a transport
//! - Retry an exchange on timeout or checksum failure, up to the retry budget
//! - Keep the last known relay states; every mutation is followed by a
//!   status query instead of trusting the module to acknowledge it
//!
//! ## Concurrency
//! A `Session` is not meant for concurrent use: `refresh` rewrites the cached
//! state. Share one module between threads through [`SharedSession`], which
//! serializes every call behind a mutex.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::network::{TcpTransport, Transport};
use crate::protocol::{
    build_get_status, build_turn_off, build_turn_on, decode_frame, format_hex,
    parse_status_response, RawFrame,
};
use crate::state::RelayState;

/// Connection settings, transport and cached relay states for one module
pub struct Session<T: Transport = TcpTransport> {
    config: Config,
    transport: T,
    relay_states: RelayState,
}

impl Session<TcpTransport> {
    /// Open a session over TCP and read the initial relay states
    pub fn connect(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = TcpTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Session<T> {
    /// Open a session over any transport and read the initial relay states
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            "Opening session to module {} at {}",
            config.module_number,
            config.addr()
        );

        let mut session = Self {
            config,
            transport,
            relay_states: RelayState::default(),
        };
        session.refresh()?;

        Ok(session)
    }

    /// Query the module and replace the cached relay states
    pub fn refresh(&mut self) -> Result<&RelayState> {
        let request = build_get_status(self.config.module_number);
        let response = self.send(&request, true)?.ok_or_else(|| {
            RelayError::Protocol("transport returned no status response".to_string())
        })?;

        self.relay_states = parse_status_response(&response, self.config.number_of_relays)?;
        tracing::debug!("Relays on: {:?}", self.relay_states.active());

        Ok(&self.relay_states)
    }

    /// Switch a relay on, then resynchronize
    pub fn turn_on(&mut self, relay_number: usize) -> Result<()> {
        let relay = self.check_relay(relay_number)?;
        let request = build_turn_on(relay, self.config.module_number);
        self.send(&request, false)?;
        self.refresh()?;
        Ok(())
    }

    /// Switch a relay off, then resynchronize
    pub fn turn_off(&mut self, relay_number: usize) -> Result<()> {
        let relay = self.check_relay(relay_number)?;
        let request = build_turn_off(relay, self.config.module_number);
        self.send(&request, false)?;
        self.refresh()?;
        Ok(())
    }

    /// Cached state of a relay as of the last refresh (no I/O)
    pub fn is_on(&self, relay_number: usize) -> Result<bool> {
        self.relay_states
            .is_on(relay_number)
            .ok_or(RelayError::InvalidRelay {
                relay: relay_number,
                max: self.config.number_of_relays,
            })
    }

    /// Cached relay states as of the last refresh
    pub fn relay_states(&self) -> &RelayState {
        &self.relay_states
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a frame, optionally waiting for a response
    ///
    /// Every attempt runs a whole connect-send-receive cycle. Timeouts and
    /// checksum failures are retried until `retry_budget` attempts have been
    /// made, then surface as `ExhaustedRetries`. Any other failure returns
    /// immediately.
    pub fn send(&mut self, request: &RawFrame, expect_response: bool) -> Result<Option<RawFrame>> {
        let attempts = self.config.retry_budget;
        let mut attempt = 1;

        loop {
            tracing::debug!(
                "Attempt {}/{}: [{}] to {}",
                attempt,
                attempts,
                format_hex(request),
                self.config.addr()
            );

            match self.attempt(request, expect_response) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!("Attempt {}/{} failed, retrying: {}", attempt, attempts, e);
                    attempt += 1;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("Attempt {}/{} failed, giving up: {}", attempt, attempts, e);
                    return Err(RelayError::ExhaustedRetries {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One exchange; the response is decoded here so a bad checksum is retried
    fn attempt(&mut self, request: &RawFrame, expect_response: bool) -> Result<Option<RawFrame>> {
        let response = self.transport.exchange(request, expect_response)?;
        if let Some(raw) = &response {
            decode_frame(raw)?;
        }
        Ok(response)
    }

    fn check_relay(&self, relay_number: usize) -> Result<u32> {
        if relay_number == 0 || relay_number > self.config.number_of_relays {
            return Err(RelayError::InvalidRelay {
                relay: relay_number,
                max: self.config.number_of_relays,
            });
        }
        Ok(relay_number as u32)
    }
}

/// Cloneable handle that lets several threads drive one module in turn
pub struct SharedSession<T: Transport = TcpTransport> {
    inner: Arc<Mutex<Session<T>>>,
}

impl<T: Transport> Clone for SharedSession<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedSession<TcpTransport> {
    pub fn connect(config: Config) -> Result<Self> {
        Ok(Self::new(Session::connect(config)?))
    }
}

impl<T: Transport> SharedSession<T> {
    pub fn new(session: Session<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Query the module and return a copy of the fresh states
    pub fn refresh(&self) -> Result<RelayState> {
        self.inner.lock().refresh().cloned()
    }

    pub fn turn_on(&self, relay_number: usize) -> Result<()> {
        self.inner.lock().turn_on(relay_number)
    }

    pub fn turn_off(&self, relay_number: usize) -> Result<()> {
        self.inner.lock().turn_off(relay_number)
    }

    pub fn is_on(&self, relay_number: usize) -> Result<bool> {
        self.inner.lock().is_on(relay_number)
    }

    /// Copy of the cached relay states
    pub fn relay_states(&self) -> RelayState {
        self.inner.lock().relay_states().clone()
    }

    /// Run several operations without another caller interleaving
    pub fn with<R>(&self, f: impl FnOnce(&mut Session<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
