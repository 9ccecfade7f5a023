//! Mock slot presence switches and indicator lights.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{HardwareError, Result, SlotIndicators, SlotSwitches};

/// Mock bank of slot switches, levels set through a handle.
///
/// # Examples
///
/// ```
/// use parkgate_hardware::SlotSwitches;
/// use parkgate_hardware::mock::MockSlotSwitches;
///
/// let (mut switches, handle) = MockSlotSwitches::new(2);
/// handle.press(1);
/// assert!(!switches.is_pressed(0).unwrap());
/// assert!(switches.is_pressed(1).unwrap());
/// ```
#[derive(Debug)]
pub struct MockSlotSwitches {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl MockSlotSwitches {
    /// Create `count` released switches.
    pub fn new(count: usize) -> (Self, MockSlotSwitchesHandle) {
        let levels = Arc::new(Mutex::new(vec![false; count]));
        (
            Self {
                levels: Arc::clone(&levels),
            },
            MockSlotSwitchesHandle { levels },
        )
    }
}

impl SlotSwitches for MockSlotSwitches {
    fn count(&self) -> usize {
        self.levels.lock().len()
    }

    fn is_pressed(&mut self, index: usize) -> Result<bool> {
        let levels = self.levels.lock();
        levels
            .get(index)
            .copied()
            .ok_or_else(|| HardwareError::channel_out_of_range("slot switches", index, levels.len()))
    }
}

#[derive(Debug, Clone)]
pub struct MockSlotSwitchesHandle {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl MockSlotSwitchesHandle {
    /// Press the switch at `index`. Out-of-range indices are ignored.
    pub fn press(&self, index: usize) {
        self.set(index, true);
    }

    /// Release the switch at `index`. Out-of-range indices are ignored.
    pub fn release(&self, index: usize) {
        self.set(index, false);
    }

    pub fn set(&self, index: usize, pressed: bool) {
        if let Some(level) = self.levels.lock().get_mut(index) {
            *level = pressed;
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.levels.lock().get(index).copied().unwrap_or(false)
    }
}

/// Mock indicator lights recording the last commanded state.
#[derive(Debug)]
pub struct MockIndicators {
    lights: Arc<Mutex<Vec<bool>>>,
}

impl MockIndicators {
    /// Create `count` lights, all off.
    pub fn new(count: usize) -> (Self, MockIndicatorsHandle) {
        let lights = Arc::new(Mutex::new(vec![false; count]));
        (
            Self {
                lights: Arc::clone(&lights),
            },
            MockIndicatorsHandle { lights },
        )
    }
}

impl SlotIndicators for MockIndicators {
    fn set(&mut self, index: usize, on: bool) -> Result<()> {
        let mut lights = self.lights.lock();
        let count = lights.len();
        let light = lights
            .get_mut(index)
            .ok_or_else(|| HardwareError::channel_out_of_range("indicators", index, count))?;
        *light = on;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockIndicatorsHandle {
    lights: Arc<Mutex<Vec<bool>>>,
}

impl MockIndicatorsHandle {
    pub fn is_on(&self, index: usize) -> bool {
        self.lights.lock().get(index).copied().unwrap_or(false)
    }

    /// Snapshot of every light.
    pub fn states(&self) -> Vec<bool> {
        self.lights.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_levels_follow_handle() {
        let (mut switches, handle) = MockSlotSwitches::new(2);
        assert_eq!(switches.count(), 2);

        handle.press(0);
        assert!(switches.is_pressed(0).unwrap());
        assert!(handle.is_pressed(0));

        handle.release(0);
        assert!(!switches.is_pressed(0).unwrap());
    }

    #[test]
    fn test_switch_out_of_range() {
        let (mut switches, handle) = MockSlotSwitches::new(1);
        handle.press(5);
        assert!(matches!(
            switches.is_pressed(1),
            Err(HardwareError::ChannelOutOfRange { index: 1, count: 1, .. })
        ));
    }

    #[test]
    fn test_indicators_record_state() {
        let (mut lights, handle) = MockIndicators::new(2);
        lights.set(1, true).unwrap();

        assert_eq!(handle.states(), vec![false, true]);
        assert!(lights.set(2, true).is_err());
    }
}
