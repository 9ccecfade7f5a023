//! Character display rendering and transient message scheduling.
//!
//! The facility display is a small character LCD (2 lines × 16 columns by
//! default). [`VirtualDisplay`] keeps the frame buffer; [`DisplayScheduler`]
//! decides what the buffer shows: one transient message at a time, each with
//! its own expiry, falling back to the default view
//!
//! ```text
//! Sistema Listo
//! Disp: 2
//! ```
//!
//! once the message expires.
//!
//! # Character Encoding - ASCII Only
//!
//! The LCD character ROM only covers printable ASCII. Control characters are
//! stripped and any other non-ASCII character is rendered as `?`, so texts
//! must be transliterated before they reach the display ("No se detecto", not
//! "No se detectó").
//!
//! # Message classes
//!
//! | Message | Class | Duration |
//! |---------|-------|----------|
//! | [`Message::Welcome`], [`Message::Pass`] | Authorized | success message time |
//! | [`Message::Denied`], [`Message::Full`] | Denied | `DISPLAY_MESSAGE_MS` |
//! | [`Message::NotDetected`] | Timeout | `DISPLAY_MESSAGE_MS` |
//!
//! The most recent message always wins: showing a message cancels the expiry
//! of any other class.

use std::time::{Duration, Instant};

use parkgate_core::config::DisplayConfig;
use parkgate_core::constants::DISPLAY_ROWS;
use parkgate_core::{Parameter, ParameterSet, Timer};
use serde::Serialize;
use tracing::debug;

/// Text alignment within a display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered, extra space on the right if odd.
    Center,
    /// Text ends at the last column, padded with spaces on the left.
    Right,
}

/// Fixed-size frame buffer of a character display.
///
/// # Examples
///
/// ```
/// use parkgate_controller::display::{Alignment, VirtualDisplay};
///
/// let mut display = VirtualDisplay::new(2, 16);
/// display.set_line(0, "Sistema Listo", Alignment::Left);
/// display.set_line(1, "Intentelo de nuevo", Alignment::Left);
///
/// assert_eq!(display.line(0), Some("Sistema Listo   "));
/// assert_eq!(display.line(1), Some("Intentelo de nue"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDisplay {
    columns: usize,
    buffer: Vec<String>,
}

impl VirtualDisplay {
    /// Create a blank display.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            columns,
            buffer: vec![" ".repeat(columns); rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.buffer.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Write one line, sanitized, aligned and truncated to the column width.
    ///
    /// Returns `false` if `row` is outside the display.
    pub fn set_line(&mut self, row: usize, text: &str, align: Alignment) -> bool {
        let Some(line) = self.buffer.get_mut(row) else {
            return false;
        };
        *line = align_text(&sanitize_text(text), self.columns, align);
        true
    }

    /// Replace the whole frame with left-aligned lines; missing lines are blank.
    pub fn set_lines(&mut self, lines: &[&str]) {
        for row in 0..self.buffer.len() {
            let text = lines.get(row).copied().unwrap_or_default();
            self.set_line(row, text, Alignment::Left);
        }
    }

    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.buffer.get(row).map(String::as_str)
    }

    /// The current frame, one string per row, each exactly `columns` wide.
    pub fn frame(&self) -> &[String] {
        &self.buffer
    }
}

/// Truncate text to at most `max_chars` characters.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align text within a fixed width, padding with spaces.
///
/// # Examples
///
/// ```
/// use parkgate_controller::display::{align_text, Alignment};
///
/// assert_eq!(align_text("LLENO", 9, Alignment::Left), "LLENO    ");
/// assert_eq!(align_text("LLENO", 9, Alignment::Center), "  LLENO  ");
/// assert_eq!(align_text("LLENO", 9, Alignment::Right), "    LLENO");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();
    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Strip control characters and replace anything outside ASCII with `?`.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Transient messages shown on the facility display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    /// Badge granted, barrier rising.
    Welcome,
    /// Badge not authorized.
    Denied,
    /// Badge authorized but no slot available.
    Full,
    /// Car passed, barrier lowering.
    Pass,
    /// No car arrived before the no-car timeout.
    NotDetected,
}

impl Message {
    pub fn class(&self) -> MessageClass {
        match self {
            Message::Welcome | Message::Pass => MessageClass::Authorized,
            Message::Denied | Message::Full => MessageClass::Denied,
            Message::NotDetected => MessageClass::Timeout,
        }
    }

    fn lines<'a>(&self, texts: &'a DisplayConfig) -> &'a [String; 2] {
        match self {
            Message::Welcome => &texts.welcome,
            Message::Denied => &texts.denied,
            Message::Full => &texts.full,
            Message::Pass => &texts.pass,
            Message::NotDetected => &texts.not_detected,
        }
    }
}

/// Expiry class of a message; each class owns one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    Denied,
    Authorized,
    Timeout,
}

impl MessageClass {
    const ALL: [MessageClass; 3] = [
        MessageClass::Denied,
        MessageClass::Authorized,
        MessageClass::Timeout,
    ];

    fn slot(self) -> usize {
        match self {
            MessageClass::Denied => 0,
            MessageClass::Authorized => 1,
            MessageClass::Timeout => 2,
        }
    }
}

/// Arbitrates the display between transient messages and the default view.
///
/// Rendering only touches the frame buffer. The controller pushes the frame to
/// the display driver through [`DisplayScheduler::take_frame`], which yields a
/// frame only when its content changed.
///
/// # Examples
///
/// ```
/// use parkgate_controller::display::{DisplayScheduler, Message};
/// use parkgate_core::ParameterSet;
/// use parkgate_core::config::DisplayConfig;
/// use std::time::{Duration, Instant};
///
/// let params = ParameterSet::default();
/// let mut display = DisplayScheduler::new(DisplayConfig::default(), Duration::from_secs(3), 2);
/// let t0 = Instant::now();
///
/// display.show(t0, Message::Denied, &params);
/// assert_eq!(display.take_frame().unwrap()[0].trim(), "ACCESO");
///
/// assert!(display.on_tick(t0 + Duration::from_secs(3), 2));
/// assert_eq!(display.take_frame().unwrap()[1].trim(), "Disp: 2");
/// ```
#[derive(Debug, Clone)]
pub struct DisplayScheduler {
    texts: DisplayConfig,
    display: VirtualDisplay,
    success_duration: Duration,
    active: Option<Message>,
    timers: [Timer; 3],
    /// Frame differs from the one last taken.
    dirty: bool,
}

impl DisplayScheduler {
    /// Create a scheduler showing the default view for `available` slots.
    pub fn new(texts: DisplayConfig, success_duration: Duration, available: usize) -> Self {
        let display = VirtualDisplay::new(DISPLAY_ROWS, texts.columns);
        let mut scheduler = Self {
            texts,
            display,
            success_duration,
            active: None,
            timers: [
                Timer::one_shot(Duration::ZERO),
                Timer::one_shot(success_duration),
                Timer::one_shot(Duration::ZERO),
            ],
            dirty: true,
        };
        scheduler.render_default(available);
        scheduler.dirty = true;
        scheduler
    }

    /// The message currently shown, if any.
    pub fn active(&self) -> Option<Message> {
        self.active
    }

    pub fn display(&self) -> &VirtualDisplay {
        &self.display
    }

    /// Show a transient message, replacing whatever is on screen.
    pub fn show(&mut self, now: Instant, message: Message, params: &ParameterSet) {
        let class = message.class();
        for other in MessageClass::ALL {
            self.timers[other.slot()].stop();
        }

        let duration = match class {
            MessageClass::Authorized => self.success_duration,
            MessageClass::Denied | MessageClass::Timeout => {
                params.duration(Parameter::MessageDuration)
            }
        };
        let timer = &mut self.timers[class.slot()];
        timer.set_interval(duration);
        timer.start(now);

        debug!(?message, ?class, ?duration, "Showing message");
        self.active = Some(message);
        let [first, second] = message.lines(&self.texts);
        let (first, second) = (first.clone(), second.clone());
        self.render(&[&first, &second]);
    }

    /// Expire the active message when its timer elapses.
    ///
    /// Returns `true` if a message expired and the default view is back.
    pub fn on_tick(&mut self, now: Instant, available: usize) -> bool {
        let Some(message) = self.active else {
            return false;
        };
        if !self.timers[message.class().slot()].update(now) {
            return false;
        }

        debug!(?message, "Message expired");
        self.active = None;
        self.render_default(available);
        true
    }

    /// Redraw the default view with a new availability count.
    ///
    /// Does nothing while a transient message is shown; the count is picked
    /// up when the message expires.
    pub fn refresh_default(&mut self, available: usize) {
        if self.active.is_none() {
            self.render_default(available);
        }
    }

    /// The frame to push to the display driver, if it changed since the last
    /// call.
    pub fn take_frame(&mut self) -> Option<Vec<String>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.display.frame().to_vec())
    }

    /// Force the next [`Self::take_frame`] to yield the current frame.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    fn render_default(&mut self, available: usize) {
        let ready = self.texts.ready.clone();
        let count = format!("Disp: {available}");
        self.render(&[&ready, &count]);
    }

    fn render(&mut self, lines: &[&str]) {
        let before = self.display.clone();
        self.display.set_lines(lines);
        if self.display != before {
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn scheduler() -> DisplayScheduler {
        DisplayScheduler::new(DisplayConfig::default(), ms(3000), 2)
    }

    #[test]
    fn test_text_truncation_at_16_characters() {
        let mut display = VirtualDisplay::new(2, 16);
        display.set_line(0, "Intentelo de nuevo", Alignment::Left);
        assert_eq!(display.line(0), Some("Intentelo de nue"));
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        let mut display = VirtualDisplay::new(1, 16);
        display.set_line(0, "No se detectó\n", Alignment::Left);
        assert_eq!(display.line(0), Some("No se detect?   "));
    }

    #[test]
    fn test_set_line_out_of_bounds() {
        let mut display = VirtualDisplay::new(2, 16);
        assert!(!display.set_line(2, "X", Alignment::Left));
    }

    #[test]
    fn test_clear_display() {
        let mut display = VirtualDisplay::new(2, 4);
        display.set_lines(&["AB", "CD"]);
        display.clear();
        assert_eq!(display.frame(), &["    ".to_string(), "    ".to_string()]);
    }

    #[test]
    fn test_text_alignment_center_odd_padding() {
        assert_eq!(align_text("ABC", 6, Alignment::Center), " ABC  ");
    }

    #[test]
    fn test_initial_frame_is_default_view() {
        let mut display = scheduler();
        let frame = display.take_frame().unwrap();
        assert_eq!(frame[0].trim(), "Sistema Listo");
        assert_eq!(frame[1].trim(), "Disp: 2");
        assert!(display.take_frame().is_none());
    }

    #[rstest]
    #[case(Message::Welcome, 3000)]
    #[case(Message::Pass, 3000)]
    #[case(Message::Denied, 1500)]
    #[case(Message::Full, 1500)]
    #[case(Message::NotDetected, 1500)]
    fn test_message_duration_by_class(#[case] message: Message, #[case] expected_ms: u64) {
        let mut params = ParameterSet::default();
        params.set(Parameter::MessageDuration, 1500).unwrap();
        let mut display = scheduler();
        let t0 = Instant::now();

        display.show(t0, message, &params);
        assert!(!display.on_tick(t0 + ms(expected_ms - 1), 2));
        assert_eq!(display.active(), Some(message));
        assert!(display.on_tick(t0 + ms(expected_ms), 2));
        assert_eq!(display.active(), None);
    }

    #[test]
    fn test_last_message_wins() {
        let params = ParameterSet::default();
        let mut display = scheduler();
        let t0 = Instant::now();

        display.show(t0, Message::Denied, &params);
        display.show(t0 + ms(1000), Message::Welcome, &params);

        // The denied expiry was cancelled.
        assert!(!display.on_tick(t0 + ms(3000), 2));
        assert_eq!(display.active(), Some(Message::Welcome));
        assert!(display.on_tick(t0 + ms(4000), 2));
    }

    #[test]
    fn test_refresh_default_waits_for_expiry() {
        let params = ParameterSet::default();
        let mut display = scheduler();
        let t0 = Instant::now();
        display.take_frame();

        display.show(t0, Message::Full, &params);
        display.take_frame();
        display.refresh_default(0);
        assert!(display.take_frame().is_none());

        display.on_tick(t0 + ms(3000), 0);
        let frame = display.take_frame().unwrap();
        assert_eq!(frame[1].trim(), "Disp: 0");
    }

    #[test]
    fn test_unchanged_default_is_not_redrawn() {
        let mut display = scheduler();
        display.take_frame();
        display.refresh_default(2);
        assert!(display.take_frame().is_none());

        display.refresh_default(1);
        assert!(display.take_frame().is_some());
    }
}
