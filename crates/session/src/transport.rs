//! Duplex transport abstraction.

use tokio::io::{AsyncRead, AsyncWrite};

/// A byte-oriented duplex link to the controller.
///
/// Blanket-implemented for every async stream, so the in-memory duplex
/// used in tests and the real serial port go through identical session
/// code.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Real serial transport, 8N1 framing at the configured baud rate.
#[cfg(feature = "real-serial")]
pub mod serial {
    use contracts::ControllerError;
    use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
    use tracing::info;

    /// Open the controller's serial port (115200 8N1 unless overridden).
    pub fn open(path: &str, baud: u32) -> Result<SerialStream, ControllerError> {
        let stream = tokio_serial::new(path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async()
            .map_err(|e| ControllerError::transport_open(path, e.to_string()))?;

        info!(path, baud, "serial port opened");
        Ok(stream)
    }
}
