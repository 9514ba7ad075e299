mod maps;

pub use maps::{LockModel, MapEntry, all_map_ids, lookup_map, map_cadence};
