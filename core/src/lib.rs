pub mod config;
pub mod encounter;
pub mod game_data;
pub mod lock;
pub mod reset;
pub mod save;
pub mod storage;

// Re-exports for convenience
pub use config::{ResetConfig, ResetConfigExt, default_script_dir};
pub use encounter::{
    BossDefinition, BossStateUpdate, DoorKind, DungeonScript, EncounterSignal, EncounterState,
    EncounterTracker, RejectReason, Transition, load_script_from_file, load_script_from_str,
};
pub use game_data::{LockModel, MapEntry, lookup_map, map_cadence};
pub use lock::{
    Admission, InstanceLock, Lifecycle, LockData, LockPayload, LockRegistry, LockUpdateEvent,
    LogAnnouncer, ResetAnnouncer,
};
pub use reset::{ResetCadence, ResetEvent, ResetEventKind, ResetQueue};
pub use save::{AdditionalValue, SaveCodec, SaveDocument, SaveError, ValueKind};
pub use storage::{LockRow, LockStore, MemoryStore, SharedRow, SpoolStore, StoreSnapshot};
