//! UCI option registry and tuning bridge
//!
//! - [`OptionsMap`]: case-insensitive, insertion-ordered set of typed
//!   [`UciOption`]s, announced to the GUI as descriptor lines and updated
//!   through `setoption` values.
//! - [`engine`]: the engine's option table and the notifications sent to
//!   search, hash table, thread pool, tablebase and book subsystems.
//! - [`tune`]: exposes in-process numeric parameters as spin options so an
//!   external SPSA loop can tune them.

pub mod engine;
pub mod error;
pub mod map;
pub mod option;
pub mod tune;

pub use engine::{EngineEvent, EngineHooks, NoHooks, register_engine_options};
pub use error::{OptionError, OptionResult};
pub use map::{OptionDescriptor, OptionsMap};
pub use option::{OnChange, OptionKind, OptionValue, UciOption};
pub use tune::{SyncPolicy, Tuner};
