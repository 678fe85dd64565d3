mod profiles;
mod storage;

pub use profiles::SupabaseProfileStore;
pub use storage::SupabaseAvatarStorage;
