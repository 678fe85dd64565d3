mod probe;

pub use probe::{ReqwestUrlProbe, DEFAULT_PROBE_TIMEOUT};
