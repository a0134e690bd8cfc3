use std::fmt;
use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};

use crate::consts::TCP_PORT;
use crate::error::{Error, Result};

/// Something that can take a finished raster job.
pub trait Transmitter {
    fn send(&mut self, instructions: &[u8]) -> Result<()>;
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    fn send(&mut self, instructions: &[u8]) -> Result<()> {
        (**self).send(instructions)
    }
}

/// Parsed printer address: `usb://0x04f9:0x2015[/serial]`, `file:///dev/usb/lp0`
/// (or a bare path), `tcp://host[:port]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAddress {
    Usb { vendor: u16, product: u16, serial: Option<String> },
    File(PathBuf),
    Tcp { host: String, port: u16 },
}

impl FromStr for DeviceAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("usb://") {
            let (ids, serial) = match rest.split_once('/') {
                Some((ids, serial)) if !serial.is_empty() => (ids, Some(serial.to_string())),
                Some((ids, _)) => (ids, None),
                None => (rest, None),
            };
            let (vendor, product) = ids
                .split_once(':')
                .ok_or_else(|| Error::Config(format!("usb address '{}' needs vendor:product", s)))?;
            return Ok(DeviceAddress::Usb { vendor: parse_id(vendor, s)?, product: parse_id(product, s)?, serial });
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            let (host, port) = match rest.rsplit_once(':') {
                Some((host, port)) => {
                    let port = port.parse().map_err(|_| Error::Config(format!("bad port in '{}'", s)))?;
                    (host, port)
                }
                None => (rest, TCP_PORT),
            };
            if host.is_empty() {
                return Err(Error::Config(format!("tcp address '{}' has no host", s)));
            }
            return Ok(DeviceAddress::Tcp { host: host.to_string(), port });
        }
        if let Some(path) = s.strip_prefix("file://") {
            return Ok(DeviceAddress::File(PathBuf::from(path)));
        }
        if s.contains("://") || s.is_empty() {
            return Err(Error::Config(format!("unsupported printer address '{}'", s)));
        }
        Ok(DeviceAddress::File(PathBuf::from(s)))
    }
}

fn parse_id(id: &str, whole: &str) -> Result<u16> {
    let hex = id.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(hex, 16).map_err(|_| Error::Config(format!("bad USB id '{}' in '{}'", id, whole)))
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAddress::Usb { vendor, product, serial: Some(serial) } => write!(f, "usb://0x{:04x}:0x{:04x}/{}", vendor, product, serial),
            DeviceAddress::Usb { vendor, product, serial: None } => write!(f, "usb://0x{:04x}:0x{:04x}", vendor, product),
            DeviceAddress::File(path) => write!(f, "file://{}", path.display()),
            DeviceAddress::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
        }
    }
}

/// Open the transport behind a printer address.
pub fn open_transmitter(device: &str) -> Result<Box<dyn Transmitter>> {
    let address: DeviceAddress = device.parse()?;
    info!("Using printer at {}", address);
    match address {
        DeviceAddress::File(path) => Ok(Box::new(DeviceFileTransmitter::new(path))),
        DeviceAddress::Tcp { host, port } => Ok(Box::new(TcpTransmitter::new(host, port))),
        #[cfg(feature = "usb")]
        DeviceAddress::Usb { vendor, product, serial } => Ok(Box::new(usb::UsbTransmitter::open(vendor, product, serial.as_deref())?)),
        #[cfg(not(feature = "usb"))]
        DeviceAddress::Usb { .. } => Err(Error::Config(format!(
            "{} needs the `usb` feature; use the kernel device instead (e.g. file:///dev/usb/lp0)",
            device
        ))),
    }
}

// ======== Kernel printer device ========

/// Writes raw jobs to a printer class device such as `/dev/usb/lp0`.
pub struct DeviceFileTransmitter {
    path: PathBuf,
}

impl DeviceFileTransmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DeviceFileTransmitter { path: path.into() }
    }
}

impl Transmitter for DeviceFileTransmitter {
    fn send(&mut self, instructions: &[u8]) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .write(true)
            .create(false)
            .open(&self.path)
            .map_err(|e| Error::Transport(format!("open {}: {}", self.path.display(), e)))?;
        f.write_all(instructions)
            .and_then(|_| f.flush())
            .map_err(|e| Error::Transport(format!("write {}: {}", self.path.display(), e)))?;
        debug!("Wrote {} bytes to {}", instructions.len(), self.path.display());
        Ok(())
    }
}

// ======== Network ========

/// Raw TCP (port 9100) for network-attached models.
pub struct TcpTransmitter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransmitter {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TcpTransmitter { host: host.into(), port, timeout: Duration::from_secs(5) }
    }
}

impl Transmitter for TcpTransmitter {
    fn send(&mut self, instructions: &[u8]) -> Result<()> {
        let target = format!("{}:{}", self.host, self.port);
        let addr = target
            .to_socket_addrs()
            .map_err(|e| Error::Transport(format!("resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| Error::Transport(format!("{} did not resolve", target)))?;
        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| Error::Transport(format!("connect {}: {}", target, e)))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| Error::Transport(format!("configure {}: {}", target, e)))?;
        stream
            .write_all(instructions)
            .and_then(|_| stream.flush())
            .map_err(|e| Error::Transport(format!("write {}: {}", target, e)))?;
        debug!("Sent {} bytes to {}", instructions.len(), target);
        Ok(())
    }
}

// ======== libusb ========

#[cfg(feature = "usb")]
pub mod usb {
    use std::time::{Duration, Instant};

    use log::{debug, warn};
    use rusb::{Direction, GlobalContext, TransferType};

    use super::Transmitter;
    use crate::consts::STATUS_TIMEOUT_MS;
    use crate::error::{Error, Result};
    use crate::raster::status::{PrinterStatus, StatusType, STATUS_LEN};

    const PRINTER_CLASS: u8 = 7;

    /// Bulk transfers straight to the printer interface; waits for the
    /// printer to report the page as printed.
    pub struct UsbTransmitter {
        handle: rusb::DeviceHandle<GlobalContext>,
        interface: u8,
        out_ep: u8,
        in_ep: Option<u8>,
    }

    impl UsbTransmitter {
        pub fn open(vendor: u16, product: u16, serial: Option<&str>) -> Result<Self> {
            for device in rusb::devices()?.iter() {
                let desc = device.device_descriptor()?;
                if desc.vendor_id() != vendor || desc.product_id() != product {
                    continue;
                }
                let mut handle = device.open()?;
                if let Some(wanted) = serial {
                    let found = handle.read_serial_number_string_ascii(&desc).unwrap_or_default();
                    if found != wanted {
                        continue;
                    }
                }

                let config = device.active_config_descriptor()?;
                for iface in config.interfaces() {
                    for alt in iface.descriptors() {
                        if alt.class_code() != PRINTER_CLASS {
                            continue;
                        }
                        let mut out_ep = None;
                        let mut in_ep = None;
                        for ep in alt.endpoint_descriptors() {
                            match (ep.transfer_type(), ep.direction()) {
                                (TransferType::Bulk, Direction::Out) => out_ep = Some(ep.address()),
                                (TransferType::Bulk, Direction::In) => in_ep = Some(ep.address()),
                                _ => {}
                            }
                        }
                        let Some(out_ep) = out_ep else { continue };
                        // not supported on every platform
                        let _ = handle.set_auto_detach_kernel_driver(true);
                        handle.claim_interface(alt.interface_number())?;
                        debug!("Claimed interface {} (out 0x{:02x})", alt.interface_number(), out_ep);
                        return Ok(UsbTransmitter { handle, interface: alt.interface_number(), out_ep, in_ep });
                    }
                }
            }
            Err(Error::Transport(format!("no printer found at usb://0x{:04x}:0x{:04x}", vendor, product)))
        }

        fn wait_until_printed(&self, in_ep: u8) -> Result<()> {
            let deadline = Instant::now() + Duration::from_millis(STATUS_TIMEOUT_MS);
            let mut reply = [0u8; STATUS_LEN];
            while Instant::now() < deadline {
                match self.handle.read_bulk(in_ep, &mut reply, Duration::from_millis(200)) {
                    Ok(n) if n >= STATUS_LEN => {
                        let status = PrinterStatus::parse(&reply)?;
                        status.check()?;
                        if status.status_type == StatusType::PrintingCompleted {
                            return Ok(());
                        }
                    }
                    Ok(_) | Err(rusb::Error::Timeout) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            warn!("Printer did not confirm the page within {} ms", STATUS_TIMEOUT_MS);
            Ok(())
        }
    }

    impl Transmitter for UsbTransmitter {
        fn send(&mut self, instructions: &[u8]) -> Result<()> {
            let mut sent = 0;
            while sent < instructions.len() {
                sent += self.handle.write_bulk(self.out_ep, &instructions[sent..], Duration::from_secs(5))?;
            }
            debug!("Sent {} bytes over USB", sent);
            match self.in_ep {
                Some(ep) => self.wait_until_printed(ep),
                None => Ok(()),
            }
        }
    }

    impl Drop for UsbTransmitter {
        fn drop(&mut self) {
            let _ = self.handle.release_interface(self.interface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_usb_ids() {
        let a: DeviceAddress = "usb://0x04f9:0x2015".parse().unwrap();
        assert_eq!(a, DeviceAddress::Usb { vendor: 0x04f9, product: 0x2015, serial: None });
        assert_eq!(a.to_string(), "usb://0x04f9:0x2015");

        let b: DeviceAddress = "usb://04f9:209b/000M6Z401370".parse().unwrap();
        assert_eq!(b, DeviceAddress::Usb { vendor: 0x04f9, product: 0x209b, serial: Some("000M6Z401370".into()) });
    }

    #[test]
    fn parses_files_and_sockets() {
        assert_eq!("file:///dev/usb/lp0".parse::<DeviceAddress>().unwrap(), DeviceAddress::File("/dev/usb/lp0".into()));
        assert_eq!("/dev/usb/lp1".parse::<DeviceAddress>().unwrap(), DeviceAddress::File("/dev/usb/lp1".into()));
        assert_eq!(
            "tcp://192.168.1.21".parse::<DeviceAddress>().unwrap(),
            DeviceAddress::Tcp { host: "192.168.1.21".into(), port: 9100 }
        );
        assert_eq!(
            "tcp://printer.local:9101".parse::<DeviceAddress>().unwrap(),
            DeviceAddress::Tcp { host: "printer.local".into(), port: 9101 }
        );
    }

    #[test]
    fn rejects_unknown_addresses() {
        assert!("bluetooth://aa:bb".parse::<DeviceAddress>().is_err());
        assert!("usb://04f9".parse::<DeviceAddress>().is_err());
        assert!("usb://zz:2015".parse::<DeviceAddress>().is_err());
        assert!("".parse::<DeviceAddress>().is_err());
    }

    #[test]
    fn device_file_receives_the_job() {
        let path = std::env::temp_dir().join(format!("badge_printer_lp_{}.bin", std::process::id()));
        std::fs::write(&path, b"").unwrap();
        let mut tx = DeviceFileTransmitter::new(&path);
        tx.send(b"\x1B\x40\x1A").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x1B\x40\x1A");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_device_is_a_transport_error() {
        let mut tx = DeviceFileTransmitter::new("/nonexistent/badge-printer/lp0");
        assert!(matches!(tx.send(b"x"), Err(Error::Transport(_))));
    }

    #[test]
    fn tcp_job_arrives_and_refusal_is_a_transport_error() {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let reader = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut got = Vec::new();
            conn.read_to_end(&mut got).unwrap();
            got
        });
        TcpTransmitter::new("127.0.0.1", port).send(b"\x1B\x40\x1A").unwrap();
        assert_eq!(reader.join().unwrap(), b"\x1B\x40\x1A");

        // nothing listens on the port any more
        let mut tx = TcpTransmitter::new("127.0.0.1", port);
        assert!(matches!(tx.send(b"x"), Err(Error::Transport(_))));
    }
}
