use std::error::Error;
use std::io::Write;

use log::{debug, trace, warn};
use strum::IntoEnumIterator;
use tokio::time::Duration;

use crate::{
    actuator::Actuator,
    constants::{CENTER_ANGLE, READY_MESSAGE, SELF_TEST_SEQUENCE},
    interpreter::parse_command,
    receiver::LineReceiver,
    source::ByteSource,
    types::{Angles, Axis},
};

/// Owns the line buffer, the last commanded angles and the actuator output.
pub struct Tracker<A: Actuator> {
    receiver: LineReceiver,
    angles: Angles,
    actuator: A,
    echo: Option<Box<dyn Write + Send>>,
}

impl<A: Actuator> Tracker<A> {
    /// Center both axes, then hand back a tracker ready for input.
    pub async fn start(actuator: A, receiver: LineReceiver) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut tracker = Tracker {
            receiver,
            angles: Angles::centered(),
            actuator,
            echo: None,
        };
        for axis in Axis::iter() {
            tracker.actuator.move_to(axis, CENTER_ANGLE).await?;
        }
        Ok(tracker)
    }

    /// Center both axes, then announce readiness on `out` with one line.
    pub async fn launch(
        actuator: A,
        receiver: LineReceiver,
        out: &mut dyn Write,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let tracker = Self::start(actuator, receiver).await?;
        writeln!(out, "{}", READY_MESSAGE)?;
        out.flush()?;
        Ok(tracker)
    }

    /// Write `Servos: X=<pan> Y=<tilt>` to `out` after every applied command.
    pub fn with_echo(mut self, out: Box<dyn Write + Send>) -> Self {
        self.echo = Some(out);
        self
    }

    pub fn angles(&self) -> Angles {
        self.angles
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn receiver(&self) -> &LineReceiver {
        &self.receiver
    }

    /// Drain whatever `source` has buffered, interpreting each completed line.
    ///
    /// Returns immediately when no byte is available. The return value is the
    /// number of lines completed during this call.
    pub async fn poll<S: ByteSource>(&mut self, source: &mut S) -> usize {
        let mut lines = 0;
        while let Some(byte) = source.try_read_byte() {
            if let Some(line) = self.receiver.push(byte) {
                lines += 1;
                self.handle_line(&line).await;
            }
        }
        lines
    }

    /// Interpret one line. Returns false when the line was discarded.
    pub async fn handle_line(&mut self, line: &str) -> bool {
        match parse_command(line) {
            Some(target) => {
                self.apply(target).await;
                true
            }
            None => {
                trace!("Ignoring line {:?}", line);
                false
            }
        }
    }

    async fn apply(&mut self, target: Angles) {
        self.angles = target;
        debug!("Target pan={} tilt={}", target.pan(), target.tilt());

        for axis in Axis::iter() {
            if let Err(e) = self.actuator.move_to(axis, target.get(axis)).await {
                warn!("Failed to move {:?} to {}: {}", axis, target.get(axis), e);
            }
        }

        if let Some(out) = self.echo.as_mut() {
            if let Err(e) = writeln!(out, "Servos: X={} Y={}", target.pan(), target.tilt()).and_then(|_| out.flush()) {
                warn!("Echo write failed: {}", e);
            }
        }
    }

    /// Step through the servo test sequence, pausing `step` between moves.
    pub async fn run_self_test(&mut self, step: Duration) {
        for (x, y) in SELF_TEST_SEQUENCE {
            let line = format!("X:{},Y:{}", x, y);
            debug!("Self-test {}", line);
            self.handle_line(&line).await;
            tokio::time::sleep(step).await;
        }
    }
}
