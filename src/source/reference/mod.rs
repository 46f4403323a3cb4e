//! Small in-tree fixture sources exercising the [`super::Source`]
//! capability traits end to end, standing in for the real network/XML
//! clients the original package ships (spec.md §1 "deliberately out of
//! scope").

pub mod anime_lists;
pub mod offline_database;

pub use anime_lists::{AnimeListEntry, AnimeListsSource};
pub use offline_database::{OfflineDatabaseEntry, OfflineDatabaseSource};
