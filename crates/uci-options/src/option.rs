//! UCI engine options
//!
//! An option is a typed value plus its default. Values are validated on
//! assignment; text only appears at the protocol boundary (descriptor lines
//! and `setoption` values).

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{OptionError, OptionResult};
use crate::map::OptionsMap;

/// Option type tag as announced to the GUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Check,
    Spin,
    Combo,
    Button,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Check => "check",
            OptionKind::Spin => "spin",
            OptionKind::Combo => "combo",
            OptionKind::Button => "button",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed option value
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Free text
    String(String),

    /// Checkbox
    Check(bool),

    /// Bounded number, `min <= value <= max`
    Spin { value: f64, min: i64, max: i64 },

    /// Enumerated choice, compared case-insensitively
    Combo { value: String, vars: Vec<String> },

    /// Trigger without a value
    Button,
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::String(_) => OptionKind::String,
            OptionValue::Check(_) => OptionKind::Check,
            OptionValue::Spin { .. } => OptionKind::Spin,
            OptionValue::Combo { .. } => OptionKind::Combo,
            OptionValue::Button => OptionKind::Button,
        }
    }

    /// Protocol text of the value. Buttons have none.
    pub fn to_text(&self) -> String {
        match self {
            OptionValue::String(s) => s.clone(),
            OptionValue::Check(b) => b.to_string(),
            OptionValue::Spin { value, .. } => format_number(*value),
            OptionValue::Combo { value, .. } => value.clone(),
            OptionValue::Button => String::new(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Change notification attached to an option.
///
/// Runs synchronously after an accepted update, with a snapshot of the
/// updated option and the registry that owns it. The handler may read or
/// set other entries of the registry. Setting the same option again from its
/// own handler recurses; callers must not do that.
pub trait OnChange: Send + Sync {
    fn on_change(&self, option: &UciOption, options: &mut OptionsMap);
}

impl<F> OnChange for F
where
    F: Fn(&UciOption, &mut OptionsMap) + Send + Sync,
{
    fn on_change(&self, option: &UciOption, options: &mut OptionsMap) {
        self(option, options)
    }
}

/// One named entry of an [`OptionsMap`]
#[derive(Clone)]
pub struct UciOption {
    pub(crate) name: String,
    pub(crate) idx: usize,
    default: OptionValue,
    current: OptionValue,
    on_change: Option<Arc<dyn OnChange>>,
}

impl UciOption {
    fn new(value: OptionValue) -> Self {
        Self {
            name: String::new(),
            idx: 0,
            default: value.clone(),
            current: value,
            on_change: None,
        }
    }

    /// Create a string option
    pub fn string(default: impl Into<String>) -> Self {
        Self::new(OptionValue::String(default.into()))
    }

    /// Create a check option
    pub fn check(default: bool) -> Self {
        Self::new(OptionValue::Check(default))
    }

    /// Create a spin option. The default is clamped into `[min, max]`.
    pub fn spin(default: i64, min: i64, max: i64) -> Self {
        debug_assert!(min <= max, "spin range inverted: {min} > {max}");
        let value = default.clamp(min, max.max(min)) as f64;
        Self::new(OptionValue::Spin { value, min, max })
    }

    /// Create a combo option
    pub fn combo<I, S>(default: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionValue::Combo {
            value: default.into(),
            vars: vars.into_iter().map(Into::into).collect(),
        })
    }

    /// Create a button option
    pub fn button() -> Self {
        Self::new(OptionValue::Button)
    }

    /// Attach a change notification
    pub fn on_change(mut self, handler: impl OnChange + 'static) -> Self {
        self.on_change = Some(Arc::new(handler));
        self
    }

    pub(crate) fn handler(&self) -> Option<Arc<dyn OnChange>> {
        self.on_change.clone()
    }

    /// Name under which the option was first registered
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insertion index within the owning registry
    pub fn index(&self) -> usize {
        self.idx
    }

    pub fn kind(&self) -> OptionKind {
        self.current.kind()
    }

    pub fn value(&self) -> &OptionValue {
        &self.current
    }

    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    /// Current value as protocol text
    pub fn current_text(&self) -> String {
        self.current.to_text()
    }

    fn mismatch(&self, expected: &'static str) -> OptionError {
        OptionError::TypeMismatch {
            name: self.name.clone(),
            expected,
            actual: self.kind(),
        }
    }

    /// Numeric view of a check (0/1) or spin option
    pub fn as_number(&self) -> OptionResult<f64> {
        match self.current {
            OptionValue::Check(b) => Ok(if b { 1.0 } else { 0.0 }),
            OptionValue::Spin { value, .. } => Ok(value),
            _ => Err(self.mismatch("check or spin")),
        }
    }

    /// Numeric view truncated toward zero
    pub fn as_i32(&self) -> OptionResult<i32> {
        self.as_number().map(|v| v as i32)
    }

    pub fn as_bool(&self) -> OptionResult<bool> {
        match self.current {
            OptionValue::Check(b) => Ok(b),
            _ => Err(self.mismatch("check")),
        }
    }

    /// Text of a string option
    pub fn as_text(&self) -> OptionResult<&str> {
        match &self.current {
            OptionValue::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Case-insensitive comparison of a combo option's current choice
    pub fn equals_choice(&self, candidate: &str) -> OptionResult<bool> {
        match &self.current {
            OptionValue::Combo { value, .. } => Ok(value.eq_ignore_ascii_case(candidate)),
            _ => Err(self.mismatch("combo")),
        }
    }

    /// Validate and store a new value.
    ///
    /// Returns `false` and leaves the option untouched when the text is
    /// rejected: empty text, anything but `true`/`false` for a check, a
    /// non-number or out-of-range number for a spin. Buttons accept anything
    /// and keep no state. Combo values are not checked against `vars`.
    ///
    /// Notification is dispatched by [`OptionsMap::set`], not here.
    pub fn assign(&mut self, text: &str) -> bool {
        if matches!(self.current, OptionValue::Button) {
            return true;
        }
        if text.is_empty() {
            return false;
        }

        match &mut self.current {
            OptionValue::Check(cur) => match text {
                "true" => *cur = true,
                "false" => *cur = false,
                _ => return false,
            },
            OptionValue::Spin { value, min, max } => match parse_number(text) {
                Some(v) if (*min as f64..=*max as f64).contains(&v) => *value = v,
                _ => return false,
            },
            OptionValue::String(cur) => *cur = text.to_string(),
            OptionValue::Combo { value, .. } => *value = text.to_string(),
            OptionValue::Button => {}
        }
        true
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl fmt::Debug for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UciOption")
            .field("name", &self.name)
            .field("idx", &self.idx)
            .field("default", &self.default)
            .field("current", &self.current)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Descriptor line announced in reply to `uci`
impl fmt::Display for UciOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option name {} type {}", self.name, self.kind())?;
        match &self.default {
            OptionValue::String(s) => write!(f, " default {s}"),
            OptionValue::Check(b) => write!(f, " default {b}"),
            OptionValue::Spin { value, min, max } => {
                write!(f, " default {} min {min} max {max}", *value as i64)
            }
            OptionValue::Combo { value, vars } => {
                write!(f, " default {value}")?;
                for var in vars {
                    write!(f, " var {var}")?;
                }
                Ok(())
            }
            OptionValue::Button => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(mut opt: UciOption, name: &str) -> UciOption {
        opt.name = name.to_string();
        opt
    }

    #[test]
    fn spin_bounds_are_inclusive() {
        let mut opt = UciOption::spin(4, 1, 512);
        assert!(!opt.assign("0"));
        assert_eq!(opt.current_text(), "4");
        assert!(opt.assign("1"));
        assert_eq!(opt.as_number().unwrap(), 1.0);
        assert!(opt.assign("512"));
        assert_eq!(opt.as_i32().unwrap(), 512);
        assert!(!opt.assign("513"));
        assert_eq!(opt.as_i32().unwrap(), 512);
    }

    #[test]
    fn spin_rejects_non_numbers() {
        let mut opt = UciOption::spin(16, 1, 1024);
        assert!(!opt.assign("abc"));
        assert!(!opt.assign("NaN"));
        assert!(!opt.assign(""));
        assert_eq!(opt.current_text(), "16");
        assert!(opt.assign("8.0"));
        assert_eq!(opt.current_text(), "8");
        assert!(opt.assign("8.5"));
        assert_eq!(opt.current_text(), "8.5");
        assert_eq!(opt.as_i32().unwrap(), 8);
    }

    #[test]
    fn check_accepts_only_lowercase_literals() {
        let mut opt = UciOption::check(false);
        assert!(!opt.assign("True"));
        assert!(!opt.assign("1"));
        assert!(!opt.as_bool().unwrap());
        assert!(opt.assign("true"));
        assert_eq!(opt.as_number().unwrap(), 1.0);
    }

    #[test]
    fn empty_text_rejected_except_for_button() {
        let mut s = UciOption::string("book.bin");
        assert!(!s.assign(""));
        assert_eq!(s.as_text().unwrap(), "book.bin");

        let mut b = UciOption::button();
        assert!(b.assign(""));
        assert!(b.assign("anything"));
        assert_eq!(b.value(), &OptionValue::Button);
    }

    #[test]
    fn combo_is_permissive_and_case_insensitive() {
        let mut opt = UciOption::combo("Both", ["Both", "White", "Black"]);
        assert!(opt.equals_choice("both").unwrap());
        assert!(!opt.equals_choice("Grey").unwrap());
        assert!(opt.assign("Grey"));
        assert!(opt.equals_choice("GREY").unwrap());
    }

    #[test]
    fn wrong_accessor_is_type_mismatch() {
        let opt = named(UciOption::string("x"), "Name");
        let err = opt.as_number().unwrap_err();
        assert_eq!(
            err,
            OptionError::TypeMismatch {
                name: "Name".to_string(),
                expected: "check or spin",
                actual: OptionKind::String,
            }
        );
        assert!(UciOption::spin(1, 0, 2).as_text().is_err());
        assert!(UciOption::check(true).equals_choice("true").is_err());
    }

    #[test]
    fn descriptor_lines() {
        let spin = named(UciOption::spin(16, 1, 131072), "Hash");
        assert_eq!(spin.to_string(), "option name Hash type spin default 16 min 1 max 131072");

        let check = named(UciOption::check(true), "NullMove");
        assert_eq!(check.to_string(), "option name NullMove type check default true");

        let string = named(UciOption::string("<empty>"), "SyzygyPath");
        assert_eq!(string.to_string(), "option name SyzygyPath type string default <empty>");

        let button = named(UciOption::button(), "Clear Hash");
        assert_eq!(button.to_string(), "option name Clear Hash type button");

        let vars = ["Off", "White", "Black", "Both"];
        let combo = named(UciOption::combo("Both", vars), "Analysis_CT");
        assert_eq!(
            combo.to_string(),
            "option name Analysis_CT type combo default Both var Off var White var Black var Both"
        );
    }

    #[test]
    fn descriptor_uses_default_not_current() {
        let mut spin = named(UciOption::spin(30, 0, 5000), "Move Overhead");
        assert!(spin.assign("100"));
        assert_eq!(
            spin.to_string(),
            "option name Move Overhead type spin default 30 min 0 max 5000"
        );
    }

    #[test]
    fn spin_default_is_clamped() {
        let opt = UciOption::spin(900, 0, 100);
        assert_eq!(opt.as_i32().unwrap(), 100);
    }
}
