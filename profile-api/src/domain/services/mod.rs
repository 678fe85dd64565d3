mod avatar;
#[cfg(test)]
pub(crate) mod fakes;
mod profile;

pub use avatar::{AvatarOptions, AvatarServiceImpl};
pub use profile::ProfileServiceImpl;
