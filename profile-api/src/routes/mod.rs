pub(crate) mod avatars;
pub(crate) mod error;
pub(crate) mod users;

pub(crate) use error::ApiError;

#[cfg(test)]
pub(crate) mod test_support;
