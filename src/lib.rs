mod constants;
mod types;
mod interpreter;
mod receiver;
mod source;
mod transport;
mod actuator;
mod tracker;

pub use actuator::{Actuator, Backend, DryRunActuator, XArmActuator};
pub use interpreter::{parse_command, parse_int_prefix};
pub use receiver::LineReceiver;
pub use source::{spawn_reader, ByteSource, ChannelSource, SerialLink};
pub use tracker::Tracker;
pub use transport::{Link, TransportError};
pub use types::{Angles, Axis, Servo};

// Re-export commonly used items
pub use constants::{BAUD_RATE, DEFAULT_MAX_LINE, READY_MESSAGE, SELF_TEST_STEP_MS};
