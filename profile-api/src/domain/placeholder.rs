//! Initials placeholder avatars from an external generator service.

use url::Url;

pub const DEFAULT_PLACEHOLDER_BASE_URL: &str = "https://ui-avatars.com/api/";
pub const DEFAULT_PLACEHOLDER_SIZE: u32 = 200;

const FOREGROUND: &str = "ffffff";

const PALETTE: [&str; 16] = [
    "1abc9c", "2ecc71", "3498db", "9b59b6", "34495e", "16a085", "27ae60", "2980b9", "8e44ad",
    "2c3e50", "f39c12", "e67e22", "e74c3c", "d35400", "c0392b", "7f8c8d",
];

#[derive(Debug, Clone)]
pub struct PlaceholderAvatar {
    base_url: Url,
    size: u32,
}

impl Default for PlaceholderAvatar {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_PLACEHOLDER_BASE_URL).expect("default placeholder URL is valid"),
            size: DEFAULT_PLACEHOLDER_SIZE,
        }
    }
}

impl PlaceholderAvatar {
    pub fn new(base_url: &str, size: u32) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            size,
        })
    }

    /// Deterministic placeholder URL for `name`.
    pub fn url_for(&self, name: &str) -> String {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("name", &initials(name))
            .append_pair("background", background_for(name))
            .append_pair("color", FOREGROUND)
            .append_pair("size", &self.size.to_string());
        url.into()
    }

    /// Whether `url` points at the placeholder generator.
    pub fn is_placeholder(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|url| {
            url.host_str() == self.base_url.host_str()
                && url.path().starts_with(self.base_url.path())
        })
    }
}

/// First letter of the first two words, uppercased. `?` when there is none.
pub fn initials(name: &str) -> String {
    let letters = name
        .split_whitespace()
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect::<String>();

    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

/// 32-bit `h * 31 + c` string hash over UTF-16 code units, wrapping on
/// overflow.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn background_for(name: &str) -> &'static str {
    let index = name_hash(name).unsigned_abs() as usize % PALETTE.len();
    PALETTE[index]
}
