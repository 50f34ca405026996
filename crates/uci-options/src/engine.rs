//! Engine option table
//!
//! Options announced by the engine at startup, and the notifications they
//! send to engine subsystems when the GUI changes them. Subsystems implement
//! [`EngineHooks`]; the registry itself does not know what a hash table or a
//! thread pool is.

use std::sync::Arc;

use log::error;

use crate::map::OptionsMap;
use crate::option::UciOption;

/// Upper bound of the `Hash` option in MiB (at most 2^32 clusters)
pub const MAX_HASH_MB: i64 = if cfg!(target_pointer_width = "64") { 131_072 } else { 2048 };

/// Notification sent to engine subsystems after an accepted option change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Reset search state (`Clear Hash`)
    ClearHash,
    /// Resize the transposition table to the given size in MiB
    ResizeHash(usize),
    /// Large-page allocation toggled; the table must be reallocated
    LargePages(bool),
    /// Redirect protocol traffic to a log file (empty path stops logging)
    StartLogger(String),
    /// Resize the search thread pool
    SetThreads(usize),
    /// (Re)initialise endgame tablebases from the given path list
    InitTablebases(String),
    /// Path used by the hash save/load commands
    SetHashFile(String),
    SaveHash,
    LoadHash,
    LoadEpdToHash,
    /// Open a polyglot opening book
    InitBook(String),
    BestBookMove(bool),
    BookDepth(i32),
}

/// Receiver of [`EngineEvent`]s
pub trait EngineHooks: Send + Sync {
    fn handle(&self, event: EngineEvent);
}

/// Hooks that ignore every event, for tools that only announce options
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl EngineHooks for NoHooks {
    fn handle(&self, _event: EngineEvent) {}
}

/// Default `Threads` value: the machine's hardware concurrency
pub fn default_threads() -> i64 {
    std::thread::available_parallelism().map(|n| n.get() as i64).unwrap_or(1)
}

fn notify(
    hooks: Arc<dyn EngineHooks>,
    make: fn(&UciOption) -> Option<EngineEvent>,
) -> impl Fn(&UciOption, &mut OptionsMap) + Send + Sync + 'static {
    move |option: &UciOption, _: &mut OptionsMap| match make(option) {
        Some(event) => hooks.handle(event),
        None => error!("option '{}' cannot produce its engine event", option.name()),
    }
}

fn spin_usize(option: &UciOption) -> Option<usize> {
    option.as_number().ok().map(|v| v as usize)
}

fn text(option: &UciOption) -> Option<String> {
    option.as_text().ok().map(str::to_string)
}

/// Register the engine's options into `options`, in announcement order.
pub fn register_engine_options(options: &mut OptionsMap, hooks: Arc<dyn EngineHooks>) {
    let o = options;
    let h = &hooks;

    o.insert(
        "Debug Log File",
        UciOption::string("")
            .on_change(notify(h.clone(), |o| text(o).map(EngineEvent::StartLogger))),
    );
    o.insert("Contempt", UciOption::spin(21, -100, 100));
    o.insert("Analysis_CT", UciOption::combo("Both", ["Off", "White", "Black", "Both"]));
    o.insert(
        "Threads",
        UciOption::spin(default_threads(), 1, 512)
            .on_change(notify(h.clone(), |o| spin_usize(o).map(EngineEvent::SetThreads))),
    );
    o.insert(
        "Hash",
        UciOption::spin(16, 1, MAX_HASH_MB)
            .on_change(notify(h.clone(), |o| spin_usize(o).map(EngineEvent::ResizeHash))),
    );
    o.insert(
        "BookFile",
        UciOption::string("Cerebellum_Light_Poly.bin")
            .on_change(notify(h.clone(), |o| text(o).map(EngineEvent::InitBook))),
    );
    o.insert(
        "BestBookMove",
        UciOption::check(true)
            .on_change(notify(h.clone(), |o| o.as_bool().ok().map(EngineEvent::BestBookMove))),
    );
    o.insert(
        "BookDepth",
        UciOption::spin(255, 1, 255)
            .on_change(notify(h.clone(), |o| o.as_i32().ok().map(EngineEvent::BookDepth))),
    );
    o.insert(
        "Clear Hash",
        UciOption::button().on_change(notify(h.clone(), |_| Some(EngineEvent::ClearHash))),
    );
    o.insert("Ponder", UciOption::check(false));
    o.insert("MultiPV", UciOption::spin(1, 1, 500));
    o.insert("Move Overhead", UciOption::spin(30, 0, 5000));
    o.insert("UCI_Chess960", UciOption::check(false));
    o.insert("NeverClearHash", UciOption::check(false));
    o.insert(
        "HashFile",
        UciOption::string("hash.hsh")
            .on_change(notify(h.clone(), |o| text(o).map(EngineEvent::SetHashFile))),
    );
    o.insert(
        "SaveHashtoFile",
        UciOption::button().on_change(notify(h.clone(), |_| Some(EngineEvent::SaveHash))),
    );
    o.insert(
        "LoadHashfromFile",
        UciOption::button().on_change(notify(h.clone(), |_| Some(EngineEvent::LoadHash))),
    );
    o.insert(
        "LoadEpdToHash",
        UciOption::button().on_change(notify(h.clone(), |_| Some(EngineEvent::LoadEpdToHash))),
    );
    o.insert("UCI_AnalyseMode", UciOption::check(false));
    o.insert(
        "Large Pages",
        UciOption::check(true)
            .on_change(notify(h.clone(), |o| o.as_bool().ok().map(EngineEvent::LargePages))),
    );
    o.insert("ICCF Analyzes", UciOption::spin(0, 0, 8));
    o.insert("NullMove", UciOption::check(true));
    o.insert(
        "SyzygyPath",
        UciOption::string("<empty>")
            .on_change(notify(h.clone(), |o| text(o).map(EngineEvent::InitTablebases))),
    );
    o.insert("SyzygyProbeDepth", UciOption::spin(1, 1, 100));
    o.insert("SyzygyProbeLimit", UciOption::spin(7, 0, 7));
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<EngineEvent>>,
    }

    impl EngineHooks for Recorder {
        fn handle(&self, event: EngineEvent) {
            self.events.lock().push(event);
        }
    }

    fn setup() -> (OptionsMap, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let mut map = OptionsMap::new();
        register_engine_options(&mut map, recorder.clone());
        (map, recorder)
    }

    #[test]
    fn table_order_and_size() {
        let (map, _) = setup();
        assert_eq!(map.len(), 25);
        let lines = map.serialize();
        assert_eq!(lines[0], "option name Debug Log File type string default ");
        assert_eq!(lines[1], "option name Contempt type spin default 21 min -100 max 100");
        assert_eq!(lines[8], "option name Clear Hash type button");
        assert_eq!(lines[24], "option name SyzygyProbeLimit type spin default 7 min 0 max 7");
    }

    #[test]
    fn accepted_changes_reach_hooks() {
        let (mut map, recorder) = setup();
        assert!(map.set("hash", "256"));
        assert!(map.set("Threads", "8"));
        assert!(map.set("Clear Hash", ""));
        assert!(map.set("SyzygyPath", "/tb/wdl"));
        assert!(map.set("BestBookMove", "false"));
        assert_eq!(
            *recorder.events.lock(),
            vec![
                EngineEvent::ResizeHash(256),
                EngineEvent::SetThreads(8),
                EngineEvent::ClearHash,
                EngineEvent::InitTablebases("/tb/wdl".to_string()),
                EngineEvent::BestBookMove(false),
            ]
        );
    }

    #[test]
    fn rejected_changes_do_not_reach_hooks() {
        let (mut map, recorder) = setup();
        assert!(!map.set("Hash", "0"));
        assert!(!map.set("Threads", "513"));
        assert!(!map.set("Large Pages", "yes"));
        assert!(!map.set("BookFile", ""));
        assert!(recorder.events.lock().is_empty());
    }

    #[test]
    fn options_without_hooks_still_update() {
        let (mut map, recorder) = setup();
        assert!(map.set("MultiPV", "3"));
        assert_eq!(map["multipv"].as_i32().unwrap(), 3);
        assert!(recorder.events.lock().is_empty());
    }
}
