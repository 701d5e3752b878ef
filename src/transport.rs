use crate::constants::*;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::time::Duration;
use hidapi::HidApi;
use log::{info, warn};
use parking_lot::Mutex;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Manager, Peripheral};
use futures::stream::StreamExt;
use uuid::Uuid;

const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000ffe000001000800000805f9b34fb);
const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000ffe100001000800000805f9b34fb);
const BLE_DEVICE_NAME: &str = "xArm";
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum TransportError {
    DeviceError(String),
    FrameTooLarge(usize),
    NoDeviceFound,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::DeviceError(msg) => write!(f, "Device error: {}", msg),
            TransportError::FrameTooLarge(len) => {
                write!(f, "Payload of {} bytes does not fit in one frame", len)
            }
            TransportError::NoDeviceFound => write!(f, "No device found"),
        }
    }
}

impl Error for TransportError {}

/// Which links to try when connecting to the servo board.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Link {
    Auto,
    Hid,
    Bluetooth,
}

pub enum Transport {
    Hid(Arc<Mutex<hidapi::HidDevice>>),
    Bluetooth {
        device: Peripheral,
        characteristic: Characteristic,
    },
}

impl Transport {
    pub async fn new(link: Link) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if link != Link::Bluetooth {
            match Self::try_hid().await {
                Ok(hid_device) => {
                    info!("Connected via USB HID");
                    return Ok(Transport::Hid(Arc::new(Mutex::new(hid_device))));
                }
                Err(e) if link == Link::Hid => {
                    warn!("Failed to connect via USB HID: {}", e);
                    return Err(Box::new(TransportError::NoDeviceFound));
                }
                Err(e) => warn!("Failed to connect via USB HID: {}. Trying Bluetooth...", e),
            }
        }

        match Self::try_bluetooth().await {
            Ok((device, characteristic)) => {
                info!("Connected via Bluetooth");
                Ok(Transport::Bluetooth {
                    device,
                    characteristic,
                })
            }
            Err(e) => {
                warn!("Failed to connect via Bluetooth: {}", e);
                Err(Box::new(TransportError::NoDeviceFound))
            }
        }
    }

    async fn try_hid() -> Result<hidapi::HidDevice, Box<dyn Error + Send + Sync>> {
        tokio::task::spawn_blocking(move || -> Result<hidapi::HidDevice, Box<dyn Error + Send + Sync>> {
            let api = HidApi::new().map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
            api.open(VENDOR_ID, PRODUCT_ID)
                .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)
        }).await?
    }

    async fn try_bluetooth() -> Result<(Peripheral, Characteristic), Box<dyn Error + Send + Sync>> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters.into_iter().next().ok_or("No Bluetooth adapter found")?;

        adapter.start_scan(ScanFilter::default()).await?;

        let mut events = adapter.events().await?;

        info!("Scanning for {}...", BLE_DEVICE_NAME);

        let mut found_device = None;
        while let Ok(Some(event)) = tokio::time::timeout(SCAN_TIMEOUT, events.next()).await {
            if let btleplug::api::CentralEvent::DeviceDiscovered(id) = event {
                let peripheral = adapter.peripheral(&id).await?;
                if let Ok(Some(properties)) = peripheral.properties().await {
                    if properties.local_name.as_deref() == Some(BLE_DEVICE_NAME) {
                        found_device = Some(peripheral);
                        break;
                    }
                }
            }
        }

        adapter.stop_scan().await?;

        let device = found_device.ok_or("xArm not found")?;
        device.connect().await?;
        device.discover_services().await?;

        let characteristic = device.characteristics()
            .into_iter()
            .find(|c| c.uuid == CHARACTERISTIC_UUID && c.service_uuid == SERVICE_UUID)
            .ok_or("Communication characteristic not found")?;

        Ok((device, characteristic))
    }

    pub async fn send(&mut self, cmd: u8, data: &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let frame = encode_frame(cmd, data)?;
        match self {
            Transport::Hid(device) => {
                let device = Arc::clone(device);
                // HID reports carry a leading report id
                let mut report_data = Vec::with_capacity(frame.len() + 1);
                report_data.push(0);
                report_data.extend_from_slice(&frame);

                let written = tokio::task::spawn_blocking(move || {
                    device.lock().write(&report_data)
                }).await??;

                if written == 0 {
                    return Err(Box::new(TransportError::DeviceError(
                        "HID write accepted no bytes".into()
                    )));
                }
                Ok(())
            }
            Transport::Bluetooth { device, characteristic } => {
                device.write(characteristic, &frame, WriteType::WithResponse).await?;
                Ok(())
            }
        }
    }
}

/// Board frame: two signature bytes, length (payload + 2), command, payload.
pub(crate) fn encode_frame(cmd: u8, data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let length = u8::try_from(data.len() + 2)
        .map_err(|_| TransportError::FrameTooLarge(data.len()))?;
    let mut frame = vec![SIGNATURE, SIGNATURE, length, cmd];
    frame.extend_from_slice(data);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let frame = encode_frame(CMD_SERVO_MOVE, &[1, 20, 0, 6, 0xf4, 0x01]).unwrap();
        assert_eq!(frame, vec![0x55, 0x55, 8, 0x03, 1, 20, 0, 6, 0xf4, 0x01]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; 300];
        assert!(matches!(
            encode_frame(CMD_SERVO_MOVE, &payload),
            Err(TransportError::FrameTooLarge(300))
        ));
    }

    #[test]
    fn error_messages() {
        assert_eq!(TransportError::NoDeviceFound.to_string(), "No device found");
        assert_eq!(
            TransportError::DeviceError("busy".into()).to_string(),
            "Device error: busy"
        );
    }
}
