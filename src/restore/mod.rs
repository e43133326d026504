mod logic; // Fetch, verify and restore one day's archive
pub(crate) mod db_restore; // mongorestore shell-out
pub(crate) mod verification; // Archive integrity checks

pub use logic::{RestoreRequest, perform_restore};
