// Serial protocol
pub const BAUD_RATE: u32 = 115_200;
pub const LINE_TERMINATOR: u8 = b'\n';
pub const DEFAULT_MAX_LINE: usize = 256;
pub const READY_MESSAGE: &str = "Pan/tilt tracker ready";

pub const X_MARKER: &str = "X:";
pub const Y_MARKER: &str = ",Y:";

// Angle limits accepted on the wire
pub const MIN_ANGLE: u8 = 0;
pub const MAX_ANGLE: u8 = 180;
pub const CENTER_ANGLE: u8 = 90;

// xArm servo board
pub const VENDOR_ID: u16 = 0x0483;
pub const PRODUCT_ID: u16 = 0x5750;
pub const SIGNATURE: u8 = 0x55;
pub const CMD_SERVO_MOVE: u8 = 0x03;

// Board-side travel, in degrees either side of center
pub const BOARD_MIN_ANGLE: f32 = -125.0;
pub const BOARD_MAX_ANGLE: f32 = 125.0;
pub const MOVE_DURATION_MS: u16 = 20;

// Sequence used by --self-test, one step every SELF_TEST_STEP_MS
pub const SELF_TEST_SEQUENCE: [(u8, u8); 9] = [
    (90, 90),
    (0, 0),
    (180, 180),
    (90, 90),
    (120, 90),
    (60, 90),
    (90, 120),
    (90, 60),
    (90, 90),
];
pub const SELF_TEST_STEP_MS: u64 = 800;
