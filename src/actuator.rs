use std::error::Error;

use log::{debug, info};

use crate::constants::*;
use crate::transport::{Link, Transport};
use crate::types::Axis;

/// Positional output for the two tracking axes.
#[allow(async_fn_in_trait)]
pub trait Actuator {
    /// Command `axis` to `angle` degrees, `angle` within [0, 180].
    async fn move_to(&mut self, axis: Axis, angle: u8) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Board position (0..=1000 over -125..=125 degrees) for a protocol angle.
pub(crate) fn angle_to_position(angle: u8) -> u16 {
    let degrees = (angle as f32 - CENTER_ANGLE as f32).clamp(BOARD_MIN_ANGLE, BOARD_MAX_ANGLE);
    ((degrees - BOARD_MIN_ANGLE) * 1000.0 / (BOARD_MAX_ANGLE - BOARD_MIN_ANGLE)).round() as u16
}

/// xArm servo board reached over USB HID or Bluetooth LE.
pub struct XArmActuator {
    transport: Transport,
}

impl XArmActuator {
    pub async fn connect(link: Link) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(XArmActuator {
            transport: Transport::new(link).await?,
        })
    }
}

impl Actuator for XArmActuator {
    async fn move_to(&mut self, axis: Axis, angle: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
        debug_assert!(angle <= MAX_ANGLE, "angle {} beyond travel", angle);
        let position = angle_to_position(angle);
        debug!("{:?} -> {} deg (board position {})", axis, angle, position);

        let data = [
            1u8,
            (MOVE_DURATION_MS & 0xff) as u8,
            ((MOVE_DURATION_MS & 0xff00) >> 8) as u8,
            axis.servo() as u8,
            (position & 0xff) as u8,
            ((position & 0xff00) >> 8) as u8,
        ];
        self.transport.send(CMD_SERVO_MOVE, &data).await
    }
}

/// Logs each move instead of driving hardware.
#[derive(Debug, Default)]
pub struct DryRunActuator;

impl Actuator for DryRunActuator {
    async fn move_to(&mut self, axis: Axis, angle: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
        debug_assert!(angle <= MAX_ANGLE, "angle {} beyond travel", angle);
        info!("[dry-run] {:?} -> {} deg", axis, angle);
        Ok(())
    }
}

/// Backend chosen at startup.
pub enum Backend {
    XArm(XArmActuator),
    DryRun(DryRunActuator),
}

impl Actuator for Backend {
    async fn move_to(&mut self, axis: Axis, angle: u8) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self {
            Backend::XArm(actuator) => actuator.move_to(axis, angle).await,
            Backend::DryRun(actuator) => actuator.move_to(axis, angle).await,
        }
    }
}
