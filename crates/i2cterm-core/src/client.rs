use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use i2cterm_protocol::{Command, RequestFrame, ResponseFrame, REQUEST_LEN, RESPONSE_LEN};
use log::{debug, trace, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::error::{BridgeError, Result};
use crate::logbuf::{Direction, FrameLog};
use crate::transport::FeatureTransport;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Pause between two response polls.
    pub poll_interval: Duration,
    /// Give up waiting for a final response after this long. `None` polls
    /// until the device answers.
    pub response_timeout: Option<Duration>,
    /// Size of the feature report buffers, report id included.
    pub report_size: usize,
    pub report_id: u8,
    /// Entries kept in the frame log.
    pub log_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            response_timeout: Some(Duration::from_secs(10)),
            report_size: 64,
            report_id: 0,
            log_capacity: 1000,
        }
    }
}

/// Cancels an in-flight [`BridgeClient::submit_with_cancel`] at its next
/// poll.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Host end of the request/response protocol.
///
/// Only one request is ever in flight. Each submission runs on a worker
/// thread that owns the transport until it has seen the final response;
/// the caller blocks until the worker is joined.
pub struct BridgeClient<T> {
    transport: Arc<Mutex<T>>,
    config: ClientConfig,
    log: FrameLog,
    /// Command sent to the device whose final response was never seen.
    in_flight: Option<u8>,
}

/// What a worker learned about the device, beyond the result itself.
#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    in_flight: Option<u8>,
    sent: bool,
}

impl<T: FeatureTransport + 'static> BridgeClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let log = FrameLog::new(config.log_capacity);
        Self {
            transport: Arc::new(Mutex::new(transport)),
            config,
            log,
            in_flight: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn log(&self) -> &FrameLog {
        &self.log
    }

    /// Direct access to the transport between submissions.
    pub fn transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock()
    }

    pub fn send(&mut self, command: Command, data: u8) -> Result<ResponseFrame> {
        self.submit(RequestFrame::new(command, data))
    }

    pub fn submit(&mut self, request: RequestFrame) -> Result<ResponseFrame> {
        self.submit_with_cancel(request, &CancelToken::new())
    }

    /// Sends `request` and waits for the response that echoes its command
    /// with a non-pending status.
    ///
    /// A request abandoned by cancellation or timeout keeps running on the
    /// device, and its final response lands in the same register. Before the
    /// next request is sent that response is waited for, within the same
    /// timeout, so it cannot be mistaken for the new one.
    pub fn submit_with_cancel(&mut self, request: RequestFrame, cancel: &CancelToken) -> Result<ResponseFrame> {
        let (done_tx, done_rx) = bounded(1);
        let transport = Arc::clone(&self.transport);
        let config = self.config.clone();
        let cancel = cancel.clone();
        let mut progress = Progress { in_flight: self.in_flight, sent: false };

        let worker = thread::Builder::new()
            .name("i2cterm-submit".into())
            .spawn(move || {
                let mut transport = transport.lock();
                let result = exchange(&mut *transport, request, &mut progress, &config, &cancel);
                let _ = done_tx.send((result, progress));
            })
            .map_err(|e| {
                warn!("failed to start submission worker: {e}");
                BridgeError::WorkerLost
            })?;

        let outcome = done_rx.recv().map_err(|_| BridgeError::WorkerLost);
        if worker.join().is_err() {
            return Err(BridgeError::WorkerLost);
        }
        let (result, progress) = outcome?;
        self.in_flight = progress.in_flight;
        if progress.sent {
            self.log.push(Direction::Tx, request.encode().to_vec());
        }
        let response = result?;

        self.log.push(Direction::Rx, response.encode().to_vec());
        Ok(response)
    }
}

fn exchange<T>(
    transport: &mut T,
    request: RequestFrame,
    progress: &mut Progress,
    config: &ClientConfig,
    cancel: &CancelToken,
) -> Result<ResponseFrame>
where
    T: FeatureTransport + ?Sized,
{
    let mut buf = vec![0u8; config.report_size.max(RESPONSE_LEN + 1)];

    if let Some(command) = progress.in_flight {
        debug!("waiting for abandoned command 0x{command:02X} to finish");
        match await_final(transport, command, &mut buf, config, cancel) {
            Ok(_) => progress.in_flight = None,
            Err(e @ BridgeError::Timeout { .. }) => {
                progress.in_flight = None;
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }

    let mut report = vec![0u8; config.report_size.max(REQUEST_LEN + 1)];
    report[0] = config.report_id;
    report[1..=REQUEST_LEN].copy_from_slice(&request.encode());
    transport.set_feature(&report)?;
    progress.sent = true;
    progress.in_flight = Some(request.command);
    debug!("sent {:02X?}", request.encode());

    let response = await_final(transport, request.command, &mut buf, config, cancel)?;
    progress.in_flight = None;
    Ok(response)
}

/// Polls until the device reports `command` with a final status.
fn await_final<T>(
    transport: &mut T,
    command: u8,
    buf: &mut [u8],
    config: &ClientConfig,
    cancel: &CancelToken,
) -> Result<ResponseFrame>
where
    T: FeatureTransport + ?Sized,
{
    let started = Instant::now();
    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        buf.fill(0);
        buf[0] = config.report_id;
        let len = transport.get_feature(buf)?;
        polls += 1;

        let payload = buf.get(1..len).unwrap_or(&[]);
        match ResponseFrame::decode(payload) {
            Ok(rsp) if rsp.completes(command) => {
                debug!("completed after {polls} polls: {:02X?}", rsp.encode());
                return Ok(rsp);
            }
            Ok(rsp) => trace!("poll {polls}: command 0x{:02X} status {:?}", rsp.command, rsp.status),
            Err(e) => trace!("poll {polls}: {e}"),
        }

        thread::sleep(config.poll_interval);

        if let Some(timeout) = config.response_timeout {
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                warn!("command 0x{command:02X} unanswered after {polls} polls");
                return Err(BridgeError::Timeout { polls, elapsed });
            }
        }
    }
}
