use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use url::Url;

use super::UserId;
use crate::domain::ProfileError;

/// A separately loaded and cached slice of a user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProfileSection {
    Basic,
    Settings,
    SocialLinks,
    Skills,
    CustomFields,
}

impl ProfileSection {
    pub const ALL: [ProfileSection; 5] = [
        Self::Basic,
        Self::Settings,
        Self::SocialLinks,
        Self::Skills,
        Self::CustomFields,
    ];

    /// `user_profiles` columns backing the section.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Basic => &["display_name", "first_name", "last_name", "bio", "avatar_url"],
            Self::Settings => &["settings"],
            Self::SocialLinks => &["social_links"],
            Self::Skills => &["skills"],
            Self::CustomFields => &["custom_fields"],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Read-only here; written through the avatar pipeline.
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Connections,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub profile_visibility: ProfileVisibility,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            locale: None,
            timezone: None,
            profile_visibility: ProfileVisibility::default(),
            email_notifications: true,
            push_notifications: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: Option<SkillLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    pub label: String,
    pub value: String,
}

/// Section payload, tagged with the section it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "snake_case")]
pub enum SectionData {
    Basic(BasicInfo),
    Settings(AccountSettings),
    SocialLinks(Vec<SocialLink>),
    Skills(Vec<Skill>),
    CustomFields(Vec<CustomField>),
}

impl SectionData {
    pub fn section(&self) -> ProfileSection {
        match self {
            Self::Basic(_) => ProfileSection::Basic,
            Self::Settings(_) => ProfileSection::Settings,
            Self::SocialLinks(_) => ProfileSection::SocialLinks,
            Self::Skills(_) => ProfileSection::Skills,
            Self::CustomFields(_) => ProfileSection::CustomFields,
        }
    }

    /// Build the section from a `user_profiles` row selected with
    /// [`ProfileSection::columns`]. Null json columns read as empty.
    pub fn from_row(section: ProfileSection, row: &Value) -> Result<Self, serde_json::Error> {
        fn column<T: serde::de::DeserializeOwned + Default>(
            row: &Value,
            name: &str,
        ) -> Result<T, serde_json::Error> {
            match row.get(name) {
                None | Some(Value::Null) => Ok(T::default()),
                Some(value) => serde_json::from_value(value.clone()),
            }
        }

        Ok(match section {
            ProfileSection::Basic => Self::Basic(serde_json::from_value(row.clone())?),
            ProfileSection::Settings => Self::Settings(column(row, "settings")?),
            ProfileSection::SocialLinks => Self::SocialLinks(column(row, "social_links")?),
            ProfileSection::Skills => Self::Skills(column(row, "skills")?),
            ProfileSection::CustomFields => Self::CustomFields(column(row, "custom_fields")?),
        })
    }

    /// Column patch for writing the section back. `avatar_url` is never part
    /// of it.
    pub fn to_columns(&self) -> Value {
        match self {
            Self::Basic(basic) => json!({
                "display_name": basic.display_name,
                "first_name": basic.first_name,
                "last_name": basic.last_name,
                "bio": basic.bio,
            }),
            Self::Settings(settings) => json!({ "settings": settings }),
            Self::SocialLinks(links) => json!({ "social_links": links }),
            Self::Skills(skills) => json!({ "skills": skills }),
            Self::CustomFields(fields) => json!({ "custom_fields": fields }),
        }
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        let section = self.section();
        let invalid = |message: String| ProfileError::InvalidSection { section, message };

        match self {
            Self::Basic(basic) => {
                if let Some(name) = &basic.display_name {
                    if name.trim().is_empty() {
                        return Err(invalid("display name cannot be blank".into()));
                    }
                }
            }
            Self::Settings(_) => {}
            Self::SocialLinks(links) => {
                for link in links {
                    if link.platform.trim().is_empty() {
                        return Err(invalid("platform cannot be blank".into()));
                    }
                    let parsed = Url::parse(&link.url)
                        .map_err(|_| invalid(format!("'{}' is not a valid URL", link.url)))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        return Err(invalid(format!("'{}' must be an http(s) URL", link.url)));
                    }
                }
            }
            Self::Skills(skills) => {
                let mut seen = HashSet::new();
                for skill in skills {
                    let name = skill.name.trim().to_lowercase();
                    if name.is_empty() {
                        return Err(invalid("skill name cannot be blank".into()));
                    }
                    if !seen.insert(name) {
                        return Err(invalid(format!("duplicate skill '{}'", skill.name)));
                    }
                }
            }
            Self::CustomFields(fields) => {
                let mut seen = HashSet::new();
                for field in fields {
                    if field.key.trim().is_empty() {
                        return Err(invalid("field key cannot be blank".into()));
                    }
                    if !seen.insert(field.key.as_str()) {
                        return Err(invalid(format!("duplicate field key '{}'", field.key)));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Row appended to `profile_history` whenever a section changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileHistoryEntry {
    pub user_id: UserId,
    pub section: ProfileSection,
    pub previous: Option<Value>,
    pub current: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_at: OffsetDateTime,
}
