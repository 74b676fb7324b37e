use tracing::debug;

// ============================================================================
// Session Configuration
// ============================================================================

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_REST_MINUTES: u32 = 5;
pub const DEFAULT_CYCLES: u32 = 4;

/// Committed, always-valid session lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub work_seconds: u32,
    pub rest_seconds: u32,
    pub total_cycles: u32,
}

// ============================================================================
// Editable Fields
// ============================================================================

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FieldId {
    WorkMinutes,
    RestMinutes,
    Cycles,
}

impl FieldId {
    pub const ALL: [FieldId; 3] = [Self::WorkMinutes, Self::RestMinutes, Self::Cycles];

    pub fn next(self) -> Self {
        match self {
            Self::WorkMinutes => Self::RestMinutes,
            Self::RestMinutes => Self::Cycles,
            Self::Cycles => Self::WorkMinutes,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::WorkMinutes => Self::Cycles,
            Self::RestMinutes => Self::WorkMinutes,
            Self::Cycles => Self::RestMinutes,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WorkMinutes => "Work (min)",
            Self::RestMinutes => "Rest (min)",
            Self::Cycles => "Pomodoros",
        }
    }

    pub fn range(self) -> (u32, u32) {
        match self {
            Self::WorkMinutes => (1, 60),
            Self::RestMinutes => (1, 30),
            Self::Cycles => (1, 12),
        }
    }
}

/// A numeric input whose raw text is tracked apart from the last value
/// that passed validation.
#[derive(Debug, Clone)]
pub struct NumericField {
    id: FieldId,
    raw: String,
    committed: u32,
}

impl NumericField {
    pub fn new(id: FieldId, value: u32) -> Self {
        let (min, max) = id.range();
        let committed = value.clamp(min, max);
        Self { id, raw: committed.to_string(), committed }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> u32 {
        self.committed
    }

    /// Replaces the raw text. Returns true when a new value was committed.
    pub fn set_text(&mut self, text: &str) -> bool {
        self.raw = text.to_string();

        let (min, max) = self.id.range();
        match parse_int(&self.raw) {
            Some(v) if v >= min as i64 && v <= max as i64 => self.commit(v as u32),
            _ => false,
        }
    }

    /// Focus-loss correction. Empty or below-minimum text snaps to the
    /// minimum; anything else that never committed reverts to the
    /// committed value.
    pub fn blur(&mut self) -> bool {
        let (min, max) = self.id.range();
        match parse_int(&self.raw) {
            None if self.raw.trim().is_empty() => self.force(min),
            Some(v) if v < min as i64 => self.force(min),
            Some(v) if v <= max as i64 => false,
            _ => {
                debug!(field = ?self.id, raw = %self.raw, "reverting uncommitted input");
                self.raw = self.committed.to_string();
                false
            }
        }
    }

    fn force(&mut self, value: u32) -> bool {
        self.raw = value.to_string();
        self.commit(value)
    }

    fn commit(&mut self, value: u32) -> bool {
        if self.committed == value {
            return false;
        }
        debug!(field = ?self.id, value, "committed");
        self.committed = value;
        true
    }
}

/// Leading-integer parse: optional sign then digits, trailing junk ignored.
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}

// ============================================================================
// Editor
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConfigEditor {
    work: NumericField,
    rest: NumericField,
    cycles: NumericField,
}

impl ConfigEditor {
    pub fn new(work_minutes: u32, rest_minutes: u32, cycles: u32) -> Self {
        Self {
            work: NumericField::new(FieldId::WorkMinutes, work_minutes),
            rest: NumericField::new(FieldId::RestMinutes, rest_minutes),
            cycles: NumericField::new(FieldId::Cycles, cycles),
        }
    }

    pub fn field(&self, id: FieldId) -> &NumericField {
        match id {
            FieldId::WorkMinutes => &self.work,
            FieldId::RestMinutes => &self.rest,
            FieldId::Cycles => &self.cycles,
        }
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut NumericField {
        match id {
            FieldId::WorkMinutes => &mut self.work,
            FieldId::RestMinutes => &mut self.rest,
            FieldId::Cycles => &mut self.cycles,
        }
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            work_seconds: self.work.value() * 60,
            rest_seconds: self.rest.value() * 60,
            total_cycles: self.cycles.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let config = ConfigEditor::new(DEFAULT_WORK_MINUTES, DEFAULT_REST_MINUTES, DEFAULT_CYCLES).config();
        assert_eq!(config.work_seconds, 1500);
        assert_eq!(config.rest_seconds, 300);
        assert_eq!(config.total_cycles, 4);
    }

    #[test]
    fn valid_keystrokes_commit_live() {
        let mut field = NumericField::new(FieldId::WorkMinutes, 25);
        assert!(field.set_text("4"));
        assert_eq!(field.value(), 4);
        assert!(field.set_text("45"));
        assert_eq!(field.value(), 45);
        assert_eq!(field.raw(), "45");
    }

    #[test]
    fn empty_text_keeps_last_commit() {
        let mut field = NumericField::new(FieldId::RestMinutes, 5);
        assert!(!field.set_text(""));
        assert_eq!(field.raw(), "");
        assert_eq!(field.value(), 5);
    }

    #[test]
    fn out_of_range_is_not_committed() {
        let mut field = NumericField::new(FieldId::Cycles, 4);
        assert!(!field.set_text("13"));
        assert_eq!(field.raw(), "13");
        assert_eq!(field.value(), 4);
    }

    #[test]
    fn blur_forces_minimum_for_zero_or_empty() {
        let mut field = NumericField::new(FieldId::WorkMinutes, 25);
        field.set_text("0");
        assert!(field.blur());
        assert_eq!(field.raw(), "1");
        assert_eq!(field.value(), 1);

        let mut field = NumericField::new(FieldId::WorkMinutes, 25);
        field.set_text("");
        assert!(field.blur());
        assert_eq!((field.raw(), field.value()), ("1", 1));
    }

    #[test]
    fn blur_reverts_text_above_maximum() {
        let mut field = NumericField::new(FieldId::WorkMinutes, 25);
        field.set_text("99");
        assert!(!field.blur());
        assert_eq!(field.raw(), "25");
        assert_eq!(field.value(), 25);
    }

    #[test]
    fn blur_leaves_valid_text_alone() {
        let mut field = NumericField::new(FieldId::RestMinutes, 5);
        field.set_text("12");
        assert!(!field.blur());
        assert_eq!((field.raw(), field.value()), ("12", 12));
    }

    #[test]
    fn parse_int_takes_leading_digits() {
        assert_eq!(parse_int("12abc"), Some(12));
        assert_eq!(parse_int(" -3"), Some(-3));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn initial_values_are_clamped_into_range() {
        let editor = ConfigEditor::new(0, 90, 40);
        assert_eq!(editor.config(), SessionConfig {
            work_seconds: 60,
            rest_seconds: 1800,
            total_cycles: 12,
        });
    }

    #[test]
    fn focus_order_wraps() {
        assert_eq!(FieldId::Cycles.next(), FieldId::WorkMinutes);
        assert_eq!(FieldId::WorkMinutes.prev(), FieldId::Cycles);
    }
}
