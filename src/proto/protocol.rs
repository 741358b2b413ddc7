//! Request/acknowledge/enquiry exchange with the gauge controller.
//!
//! A query runs through these steps while holding both locks:
//!
//! 1. the command frame `<header><CR><LF>` is written,
//! 2. one frame is read and must be `<ACK>`; `<NAK>` or anything else ends
//!    the query with a [`CommunicationError`],
//! 3. `<ENQ>` is written, unless the enquiry was suppressed,
//! 4. the data frame is read and split into its comma separated fields.
//!
//! Suppressing the enquiry is what allows continuous mode: after `COM` the
//! gauge starts streaming on its own, and an `<ENQ>` would interrupt it.

use bytes::{BufMut, Bytes, BytesMut};
use std::str;
use tracing::{debug, warn};

use super::codec::TERMINATOR;
use super::lock::InterProcessLock;
use super::transport::{SharedTransport, Transport};
use super::{CommunicationError, DecodingError, ProtoError, Result};

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;
pub const ENQ: u8 = 0x05;
pub const ETX: u8 = 0x03;

const FIELD_SEPARATOR: char = ',';
const CLEAR_CHUNK: usize = 32;

/// Whether the enquiry step of an exchange runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enquiry {
    Send,
    Skip,
}

impl Enquiry {
    fn from_skip(skip: bool) -> Self {
        if skip {
            Enquiry::Skip
        } else {
            Enquiry::Send
        }
    }
}

pub struct Protocol {
    transport: SharedTransport,
    lock: InterProcessLock,
    skip_enquiry: bool,
}

impl Protocol {
    pub fn new(transport: SharedTransport, lock: InterProcessLock) -> Self {
        Self {
            transport,
            lock,
            skip_enquiry: false,
        }
    }

    /// Builds a command frame. Arguments are appended verbatim.
    pub fn create_message<S: AsRef<str>>(header: &str, args: &[S]) -> Result<Bytes> {
        let mut msg = BytesMut::with_capacity(header.len() + TERMINATOR.len());
        for part in std::iter::once(header).chain(args.iter().map(AsRef::as_ref)) {
            if !part.is_ascii() {
                return Err(ProtoError::invalid("command", part));
            }
            msg.put_slice(part.as_bytes());
        }
        msg.put_slice(TERMINATOR);
        Ok(msg.freeze())
    }

    /// Suppresses the enquiry of the next query only.
    pub fn skip_next_enquiry(&mut self, skip: bool) {
        self.skip_enquiry = skip;
    }

    pub fn skips_next_enquiry(&self) -> bool {
        self.skip_enquiry
    }

    /// Runs one full exchange and returns the raw response fields.
    ///
    /// Returns no fields when the enquiry was suppressed. The suppression
    /// flag is cleared before anything is sent.
    pub async fn query<S: AsRef<str>>(&mut self, header: &str, args: &[S]) -> Result<Vec<String>> {
        let enquiry = Enquiry::from_skip(std::mem::take(&mut self.skip_enquiry));
        self.exchange(header, args, enquiry).await
    }

    pub async fn exchange<S: AsRef<str>>(
        &self,
        header: &str,
        args: &[S],
        enquiry: Enquiry,
    ) -> Result<Vec<String>> {
        let message = Self::create_message(header, args)?;

        let _process = self.lock.acquire().await?;
        let mut transport = self.transport.lock().await;

        debug!("Query: {:?}", message);
        transport.write(&message).await.map_err(communication)?;
        Self::acknowledged(&mut transport).await?;

        if enquiry == Enquiry::Skip {
            debug!("Enquiry skipped for {:?}", header);
            return Ok(Vec::new());
        }

        transport.write(&[ENQ]).await.map_err(communication)?;
        let response = transport.read_frame().await.map_err(communication)?;
        debug!("Response: {:?}", response);
        parse_response(&response)
    }

    async fn acknowledged(transport: &mut Transport) -> Result<()> {
        let response = transport.read_frame().await.map_err(communication)?;
        match response.as_ref() {
            [ACK] => Ok(()),
            [NAK] => {
                warn!("Negative acknowledgement received");
                Err(CommunicationError::Nack.into())
            }
            other => {
                warn!("No acknowledgement received: {:?}", response);
                Err(CommunicationError::NoAck(other.to_vec()).into())
            }
        }
    }

    /// Reads one frame without any handshake, as sent in continuous mode.
    pub async fn read_response(&self) -> Result<Vec<String>> {
        let mut transport = self.transport.lock().await;
        let response = transport.read_frame().await.map_err(communication)?;
        debug!("Streamed: {:?}", response);
        parse_response(&response)
    }

    /// Sends `<ETX>` to reset the interface; nothing is read back.
    pub async fn reset_line(&self) -> Result<()> {
        let _process = self.lock.acquire().await?;
        let mut transport = self.transport.lock().await;
        transport.write(&[ETX]).await
    }

    /// Stops any continuous output and discards everything until the line
    /// goes quiet for one timeout period.
    pub async fn clear_buffer(&self) -> Result<()> {
        let _process = self.lock.acquire().await?;
        let mut transport = self.transport.lock().await;

        debug!("Clearing message buffer...");
        transport.write(TERMINATOR).await?;
        let mut discarded = 0;
        loop {
            match transport.read_bytes(CLEAR_CHUNK).await {
                Ok(chunk) => discarded += chunk.len(),
                Err(ProtoError::Timeout) => {
                    debug!("Discarded {} bytes", discarded);
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn communication(err: ProtoError) -> ProtoError {
    match err {
        ProtoError::Timeout => CommunicationError::Timeout.into(),
        other => other,
    }
}

/// Splits a response frame into its fields.
pub fn parse_response(response: &[u8]) -> Result<Vec<String>> {
    let text =
        str::from_utf8(response).map_err(|_| DecodingError::NotAscii(response.to_vec()))?;
    if !text.is_ascii() {
        return Err(DecodingError::NotAscii(response.to_vec()).into());
    }
    Ok(text.split(FIELD_SEPARATOR).map(String::from).collect())
}
