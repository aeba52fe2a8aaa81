use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::StreamTransport;
use crate::traits::Transport;

/// Default line speed.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Line settings applied when opening a serial device.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed in bits per second. Default: 115200.
    pub baud_rate: u32,
    /// How long a read waits for the first byte before reporting nothing
    /// available. Rounded to tenths of a second (1..=25.5s). Default: 100ms.
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// A serial device in raw 8N1 mode.
///
/// Reads return after `read_timeout` with whatever arrived, so the device can
/// be polled from a single-threaded consumption loop.
pub struct SerialPort {
    transport: StreamTransport<File>,
    path: PathBuf,
}

impl SerialPort {
    /// Open and configure a serial device, discarding any pending I/O.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_constant(config.baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| TransportError::Open {
                path: path.clone(),
                source: e,
            })?;

        configure(&file, speed, config.read_timeout).map_err(|e| TransportError::Configure {
            path: path.clone(),
            source: e,
        })?;

        info!(?path, baud = config.baud_rate, "opened serial device");

        Ok(Self {
            transport: StreamTransport::new(file),
            path,
        })
    }

    /// Path of the opened device.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for SerialPort {
    fn available(&mut self) -> Result<usize> {
        self.transport.available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.transport.read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.transport.write_byte(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.transport.flush()
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .finish()
    }
}

fn configure(file: &File, speed: libc::speed_t, read_timeout: Duration) -> std::io::Result<()> {
    let fd = file.as_raw_fd();

    let mut tio = std::mem::MaybeUninit::<libc::termios>::uninit();
    // SAFETY: `fd` is an open descriptor owned by `file`, and `tio` points to
    // writable storage sized for a `termios`.
    if unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: `tcgetattr` succeeded, so every field of `tio` is initialized.
    let mut tio = unsafe { tio.assume_init() };

    // SAFETY: `tio` is a valid, initialized `termios` owned by this frame.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag |= libc::CLOCAL | libc::CREAD;
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = read_timeout_deciseconds(read_timeout);

    // SAFETY: as above; `speed` is one of the platform `B*` constants.
    let rc = unsafe { libc::cfsetispeed(&mut tio, speed) | libc::cfsetospeed(&mut tio, speed) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: `fd` is open and `tio` is a fully initialized `termios`.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    // Back to blocking reads so VTIME governs how long a read waits.
    // SAFETY: plain fcntl flag manipulation on an open descriptor.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: see above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(std::io::Error::last_os_error());
    }

    // SAFETY: discards pending input and output on an open tty descriptor.
    if unsafe { libc::tcflush(fd, libc::TCIOFLUSH) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    debug!(fd, "serial line configured");
    Ok(())
}

fn read_timeout_deciseconds(timeout: Duration) -> libc::cc_t {
    (timeout.as_millis() / 100).clamp(1, 255) as libc::cc_t
}

fn baud_constant(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        other => return Err(TransportError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}
