mod http;
mod media;
mod supabase;

pub use http::{ReqwestUrlProbe, DEFAULT_PROBE_TIMEOUT};
pub use media::UriFileSource;
pub use supabase::{SupabaseAvatarStorage, SupabaseProfileStore};
