use strum_macros::EnumIter;

use crate::constants::{CENTER_ANGLE, MAX_ANGLE, MIN_ANGLE};

#[derive(Debug, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Axis {
    Pan,  // horizontal, X on the wire
    Tilt, // vertical, Y on the wire
}

impl Axis {
    pub fn servo(self) -> Servo {
        match self {
            Axis::Pan => Servo::BaseSpin,
            Axis::Tilt => Servo::WristTilt,
        }
    }
}

/// Servo ids on the xArm board.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Servo {
    WristTilt = 3, // -125 to 125 up to down
    BaseSpin = 6,  // -125 to 125 clockwise
}

/// Last commanded position of both axes, in degrees within [0, 180].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Angles {
    pan: u8,
    tilt: u8,
}

impl Angles {
    /// Values above the travel limit saturate at it.
    pub fn new(pan: u8, tilt: u8) -> Self {
        Angles {
            pan: pan.min(MAX_ANGLE),
            tilt: tilt.min(MAX_ANGLE),
        }
    }

    pub fn pan(&self) -> u8 {
        self.pan
    }

    pub fn tilt(&self) -> u8 {
        self.tilt
    }

    pub fn centered() -> Self {
        Angles::new(CENTER_ANGLE, CENTER_ANGLE)
    }

    pub fn get(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }
}

impl Default for Angles {
    fn default() -> Self {
        Angles::centered()
    }
}

pub(crate) fn clamp_angle(angle: i64) -> u8 {
    angle.clamp(MIN_ANGLE as i64, MAX_ANGLE as i64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn clamp_saturates_at_both_ends() {
        assert_eq!(clamp_angle(-50), 0);
        assert_eq!(clamp_angle(0), 0);
        assert_eq!(clamp_angle(137), 137);
        assert_eq!(clamp_angle(180), 180);
        assert_eq!(clamp_angle(200), 180);
        assert_eq!(clamp_angle(i64::MAX), 180);
        assert_eq!(clamp_angle(i64::MIN), 0);
    }

    #[test]
    fn new_saturates_above_travel() {
        let angles = Angles::new(200, 0);
        assert_eq!((angles.pan(), angles.tilt()), (180, 0));
        assert_eq!(Angles::new(255, 181), Angles::new(180, 180));
    }

    #[test]
    fn axes_map_to_board_servos() {
        assert_eq!(Axis::Pan.servo() as u8, 6);
        assert_eq!(Axis::Tilt.servo() as u8, 3);
    }

    #[test]
    fn default_is_center() {
        assert_eq!(Angles::default(), Angles::new(90, 90));
    }

    #[test]
    fn get_reads_each_axis() {
        let angles = Angles::new(12, 170);
        let read: Vec<u8> = Axis::iter().map(|axis| angles.get(axis)).collect();
        assert_eq!(read, vec![12, 170]);
    }
}
