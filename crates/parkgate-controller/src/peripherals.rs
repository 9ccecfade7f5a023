//! The set of devices driven by the controller.

use parkgate_hardware::mock::{
    MockBadgeReader, MockBadgeReaderHandle, MockDisplay, MockDisplayHandle, MockDistanceSensor,
    MockDistanceSensorHandle, MockIndicators, MockIndicatorsHandle, MockServo, MockServoHandle,
    MockSlotSwitches, MockSlotSwitchesHandle,
};
use parkgate_hardware::{
    BadgeReader, DistanceSensor, ServoDriver, SlotIndicators, SlotSwitches, TextDisplay,
};

/// Every peripheral of one facility, owned by the controller.
pub struct Peripherals {
    pub badge_reader: Box<dyn BadgeReader>,
    pub distance_sensor: Box<dyn DistanceSensor>,
    pub slot_switches: Box<dyn SlotSwitches>,
    pub indicators: Box<dyn SlotIndicators>,
    pub entry_servo: Box<dyn ServoDriver>,
    pub exit_servo: Box<dyn ServoDriver>,
    pub display: Box<dyn TextDisplay>,
}

/// Control handles of a [`Peripherals::mock`] set.
#[derive(Debug, Clone)]
pub struct MockHandles {
    pub badge_reader: MockBadgeReaderHandle,
    pub distance_sensor: MockDistanceSensorHandle,
    pub slot_switches: MockSlotSwitchesHandle,
    pub indicators: MockIndicatorsHandle,
    pub entry_servo: MockServoHandle,
    pub exit_servo: MockServoHandle,
    pub display: MockDisplayHandle,
}

impl Peripherals {
    /// Mock devices for a facility of `slot_count` slots.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_controller::Peripherals;
    ///
    /// let (peripherals, handles) = Peripherals::mock(2);
    /// assert_eq!(peripherals.slot_switches.count(), 2);
    /// handles.slot_switches.press(0);
    /// ```
    pub fn mock(slot_count: usize) -> (Self, MockHandles) {
        let (badge_reader, badge_reader_handle) = MockBadgeReader::new();
        let (distance_sensor, distance_sensor_handle) = MockDistanceSensor::new();
        let (slot_switches, slot_switches_handle) = MockSlotSwitches::new(slot_count);
        let (indicators, indicators_handle) = MockIndicators::new(slot_count);
        let (entry_servo, entry_servo_handle) = MockServo::new();
        let (exit_servo, exit_servo_handle) = MockServo::new();
        let (display, display_handle) = MockDisplay::new();

        let peripherals = Self {
            badge_reader: Box::new(badge_reader),
            distance_sensor: Box::new(distance_sensor),
            slot_switches: Box::new(slot_switches),
            indicators: Box::new(indicators),
            entry_servo: Box::new(entry_servo),
            exit_servo: Box::new(exit_servo),
            display: Box::new(display),
        };
        let handles = MockHandles {
            badge_reader: badge_reader_handle,
            distance_sensor: distance_sensor_handle,
            slot_switches: slot_switches_handle,
            indicators: indicators_handle,
            entry_servo: entry_servo_handle,
            exit_servo: exit_servo_handle,
            display: display_handle,
        };
        (peripherals, handles)
    }
}
