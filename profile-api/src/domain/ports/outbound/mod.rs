mod avatar_storage;
mod clock;
mod file_source;
mod profile_store;
mod url_probe;

pub use avatar_storage::*;
pub use clock::*;
pub use file_source::*;
pub use profile_store::*;
pub use url_probe::*;
