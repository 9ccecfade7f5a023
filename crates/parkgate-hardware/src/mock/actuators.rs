//! Mock servo and text display.
//!
//! Both record every command so tests can assert on the full sequence, and
//! both can be told to fail, to exercise initialization and runtime fault
//! handling.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{HardwareError, Result, ServoDriver, TextDisplay};

#[derive(Debug, Default)]
struct ServoState {
    angles: Vec<u8>,
    failing: bool,
}

/// Mock servo recording every angle written to it.
///
/// # Examples
///
/// ```
/// use parkgate_hardware::ServoDriver;
/// use parkgate_hardware::mock::MockServo;
///
/// let (mut servo, handle) = MockServo::new();
/// servo.write_angle(90).unwrap();
/// servo.write_angle(0).unwrap();
/// assert_eq!(handle.angles(), vec![90, 0]);
/// assert_eq!(handle.angle(), Some(0));
/// ```
#[derive(Debug)]
pub struct MockServo {
    state: Arc<Mutex<ServoState>>,
}

impl MockServo {
    pub fn new() -> (Self, MockServoHandle) {
        let state = Arc::new(Mutex::new(ServoState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockServoHandle { state },
        )
    }
}

impl ServoDriver for MockServo {
    fn write_angle(&mut self, angle: u8) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(HardwareError::actuator_fault("servo not responding"));
        }
        if angle > 180 {
            return Err(HardwareError::invalid_input(format!(
                "servo angle {angle} beyond 180"
            )));
        }
        state.angles.push(angle);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockServoHandle {
    state: Arc<Mutex<ServoState>>,
}

impl MockServoHandle {
    /// Last angle written, or `None` if never commanded.
    pub fn angle(&self) -> Option<u8> {
        self.state.lock().angles.last().copied()
    }

    /// Every angle written, oldest first.
    pub fn angles(&self) -> Vec<u8> {
        self.state.lock().angles.clone()
    }

    /// Make every subsequent write fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    frames: Vec<Vec<String>>,
    failing: bool,
}

/// Mock text display recording every frame drawn.
#[derive(Debug)]
pub struct MockDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let state = Arc::new(Mutex::new(DisplayState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDisplayHandle { state },
        )
    }
}

impl TextDisplay for MockDisplay {
    fn draw(&mut self, lines: &[String]) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(HardwareError::disconnected("mock display"));
        }
        state.frames.push(lines.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    state: Arc<Mutex<DisplayState>>,
}

impl MockDisplayHandle {
    /// Lines of the last frame drawn; empty if nothing was drawn.
    pub fn lines(&self) -> Vec<String> {
        self.state.lock().frames.last().cloned().unwrap_or_default()
    }

    /// Line `row` of the last frame, or an empty string.
    pub fn line(&self, row: usize) -> String {
        self.lines().get(row).cloned().unwrap_or_default()
    }

    pub fn frame_count(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Whether any frame drawn so far had `text` as its first line.
    pub fn has_shown(&self, text: &str) -> bool {
        self.state
            .lock()
            .frames
            .iter()
            .any(|frame| frame.first().is_some_and(|line| line.trim() == text))
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}
