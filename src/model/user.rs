use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Owner of a task as reported by the project's member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            avatar: avatar.into(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("avatar", &self.avatar),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Invalid {
                entity: "user",
                missing,
            })
        }
    }
}

/// Member entry from `/projects/{id}/users.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct Member {
    pub id: u64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gravatar_url: Option<String>,
}

impl From<Member> for User {
    fn from(member: Member) -> Self {
        let name = [member.first_name, member.last_name]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        User::new(
            name,
            member.email.unwrap_or_default(),
            member.gravatar_url.unwrap_or_default(),
        )
    }
}
