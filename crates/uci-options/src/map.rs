//! Option registry
//!
//! Names are matched case-insensitively as the UCI protocol requires, while
//! the announcement order is the order in which options were inserted.

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

use log::{debug, warn};
use serde::Serialize;

use crate::error::{OptionError, OptionResult};
use crate::option::{OptionKind, OptionValue, UciOption};

fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Case-insensitive, insertion-ordered collection of options.
///
/// Insertion indices come from a counter owned by the map. Use
/// [`OptionsMap::with_first_index`] to continue numbering from another map.
#[derive(Debug, Default)]
pub struct OptionsMap {
    entries: HashMap<String, UciOption>,
    next_idx: usize,
}

impl OptionsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty map whose first inserted option gets index `first`
    pub fn with_first_index(first: usize) -> Self {
        Self {
            entries: HashMap::new(),
            next_idx: first,
        }
    }

    /// Index the next inserted option will receive
    pub fn next_index(&self) -> usize {
        self.next_idx
    }

    /// Register `option` under `name` and return its index.
    ///
    /// Inserting under a name that already exists (in any letter case)
    /// replaces that option but keeps its stored name and index.
    pub fn insert(&mut self, name: &str, mut option: UciOption) -> usize {
        let key = fold(name);
        if let Some(existing) = self.entries.get_mut(&key) {
            warn!("option '{}' registered twice, replacing previous definition", existing.name);
            option.name = existing.name.clone();
            option.idx = existing.idx;
            *existing = option;
            return existing.idx;
        }

        let idx = self.next_idx;
        self.next_idx += 1;
        option.name = name.to_string();
        option.idx = idx;
        self.entries.insert(key, option);
        idx
    }

    pub fn get(&self, name: &str) -> Option<&UciOption> {
        self.entries.get(&fold(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UciOption> {
        self.entries.get_mut(&fold(name))
    }

    /// Lookup that treats an absent name as a contract violation
    pub fn lookup(&self, name: &str) -> OptionResult<&UciOption> {
        self.get(name).ok_or_else(|| OptionError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&fold(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &UciOption> {
        let mut ordered: Vec<&UciOption> = self.entries.values().collect();
        ordered.sort_by_key(|o| o.idx);
        ordered.into_iter()
    }

    /// Apply a `setoption` value.
    ///
    /// Unknown names and rejected values are no-ops and return `false`.
    /// On acceptance the option's notification runs before this returns.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let Some(option) = self.entries.get_mut(&fold(name)) else {
            warn!("No such option: {name}");
            return false;
        };

        if !option.assign(value) {
            debug!("option '{}' rejected value '{value}'", option.name);
            return false;
        }
        debug!("option '{}' = '{}'", option.name, option.current_text());

        if let Some(handler) = option.handler() {
            let snapshot = option.clone();
            handler.on_change(&snapshot, self);
        }
        true
    }

    /// Descriptor lines in insertion order
    pub fn serialize(&self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }

    /// Structured descriptors in insertion order
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        self.iter().map(OptionDescriptor::from).collect()
    }
}

impl Index<&str> for OptionsMap {
    type Output = UciOption;

    fn index(&self, name: &str) -> &UciOption {
        match self.lookup(name) {
            Ok(option) => option,
            Err(e) => panic!("{e}"),
        }
    }
}

/// All descriptor lines, one per line
impl fmt::Display for OptionsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for option in self.iter() {
            writeln!(f, "{option}")?;
        }
        Ok(())
    }
}

/// Serializable form of a descriptor line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<String>,
}

impl From<&UciOption> for OptionDescriptor {
    fn from(option: &UciOption) -> Self {
        let mut desc = OptionDescriptor {
            name: option.name().to_string(),
            kind: option.kind(),
            default: None,
            min: None,
            max: None,
            vars: Vec::new(),
        };
        match option.default_value() {
            OptionValue::String(s) => desc.default = Some(s.clone()),
            OptionValue::Check(b) => desc.default = Some(b.to_string()),
            OptionValue::Spin { value, min, max } => {
                desc.default = Some((*value as i64).to_string());
                desc.min = Some(*min);
                desc.max = Some(*max);
            }
            OptionValue::Combo { value, vars } => {
                desc.default = Some(value.clone());
                desc.vars = vars.clone();
            }
            OptionValue::Button => {}
        }
        desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn lookup_ignores_case() {
        let mut map = OptionsMap::new();
        map.insert("Hash", UciOption::spin(16, 1, 1024));
        assert_eq!(map.lookup("HASH").unwrap().index(), map.lookup("hash").unwrap().index());
        assert_eq!(map["hAsH"].name(), "Hash");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn missing_name_is_not_found() {
        let map = OptionsMap::new();
        assert_eq!(map.lookup("Threads").unwrap_err(), OptionError::NotFound("Threads".into()));
    }

    #[test]
    #[should_panic(expected = "no such option")]
    fn index_panics_on_missing_name() {
        let map = OptionsMap::new();
        let _ = &map["Threads"];
    }

    #[test]
    fn reinsert_keeps_first_name_and_index() {
        let mut map = OptionsMap::new();
        map.insert("Ponder", UciOption::check(false));
        map.insert("Hash", UciOption::spin(16, 1, 1024));
        let idx = map.insert("PONDER", UciOption::check(true));
        assert_eq!(idx, 0);
        assert_eq!(map.len(), 2);
        assert_eq!(map["ponder"].name(), "Ponder");
        assert!(map["ponder"].as_bool().unwrap());
        assert_eq!(map.next_index(), 2);
    }

    #[test]
    fn serialize_follows_insertion_order() {
        let mut map = OptionsMap::new();
        map.insert("Zeta", UciOption::check(false));
        map.insert("Alpha", UciOption::spin(1, 0, 9));
        map.insert("Mid", UciOption::button());
        assert_eq!(
            map.serialize(),
            vec![
                "option name Zeta type check default false",
                "option name Alpha type spin default 1 min 0 max 9",
                "option name Mid type button",
            ]
        );
        let names: Vec<_> = map.iter().map(|o| o.name().to_string()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn counter_can_continue_across_maps() {
        let mut first = OptionsMap::new();
        first.insert("A", UciOption::button());
        first.insert("B", UciOption::button());
        let mut second = OptionsMap::with_first_index(first.next_index());
        assert_eq!(second.insert("C", UciOption::button()), 2);
    }

    #[test]
    fn set_fires_notification_once_on_accept() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut map = OptionsMap::new();
        map.insert(
            "Threads",
            UciOption::spin(4, 1, 512).on_change(move |_: &UciOption, _: &mut OptionsMap| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(!map.set("Threads", "0"));
        assert_eq!(map["Threads"].current_text(), "4");
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(map.set("threads", "8"));
        assert_eq!(map["Threads"].current_text(), "8");
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(map["Threads"].index(), 0);
    }

    #[test]
    fn set_unknown_name_is_noop() {
        let mut map = OptionsMap::new();
        assert!(!map.set("Nope", "1"));
        assert!(map.is_empty());
    }

    #[test]
    fn handler_sees_updated_option_and_can_touch_registry() {
        let mut map = OptionsMap::new();
        map.insert("Mirror", UciOption::spin(0, 0, 100));
        map.insert(
            "Source",
            UciOption::spin(0, 0, 100).on_change(|o: &UciOption, m: &mut OptionsMap| {
                let text = o.current_text();
                m.set("Mirror", &text);
            }),
        );
        assert!(map.set("Source", "42"));
        assert_eq!(map["Mirror"].as_i32().unwrap(), 42);
    }

    #[test]
    fn button_notifies_without_state() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut map = OptionsMap::new();
        map.insert(
            "Clear Hash",
            UciOption::button().on_change(move |_: &UciOption, _: &mut OptionsMap| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(map.set("clear hash", ""));
        assert!(map.set("Clear Hash", "whatever"));
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn descriptors_mirror_lines() {
        let mut map = OptionsMap::new();
        map.insert("Mode", UciOption::combo("Both", ["Both", "White", "Black"]));
        map.insert("Go", UciOption::button());
        let desc = map.descriptors();
        assert_eq!(desc[0].kind, OptionKind::Combo);
        assert_eq!(desc[0].default.as_deref(), Some("Both"));
        assert_eq!(desc[0].vars, ["Both", "White", "Black"]);
        assert_eq!(desc[1].default, None);
    }

    #[test]
    fn map_is_shareable_between_readers() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OptionsMap>();
    }
}
