use async_trait::async_trait;

use super::Resource;
use crate::base::{Base, Record, RequestOptions};
use crate::config::Config;
use crate::error::{Error, Result};

/// A workflow stage of the project board. Positions are 1-based.
#[derive(Debug, Clone)]
pub struct Column {
    pub id: u64,
    pub name: String,
    pub position: u32,
    base: Base,
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Column {
    /// Build a column from a response record; fails if id, name or position is missing.
    pub fn new(config: &Config, record: &Record) -> Result<Self> {
        let id = record.get("id").and_then(|v| v.as_u64());
        let name = record
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty());
        let position = record
            .get("position")
            .and_then(|v| v.as_u64())
            .and_then(|p| u32::try_from(p).ok());

        match (id, name, position) {
            (Some(id), Some(name), Some(position)) => Ok(Self {
                id,
                name: name.to_string(),
                position,
                base: Base::new(config.clone()),
            }),
            _ => {
                let missing = [
                    ("id", id.is_none()),
                    ("name", name.is_none()),
                    ("position", position.is_none()),
                ]
                .into_iter()
                .filter(|(_, absent)| *absent)
                .map(|(field, _)| field)
                .collect();
                Err(Error::Invalid {
                    entity: "column",
                    missing,
                })
            }
        }
    }

    pub fn is_first(&self) -> bool {
        self.position == 1
    }

    pub fn is_second(&self) -> bool {
        self.position == 2
    }

    /// Re-fetches the column list on every call.
    pub async fn is_last(&self) -> Result<bool> {
        let columns = Column::all(self.base.config()).await?;
        Ok(columns.last().is_some_and(|last| last.id == self.id))
    }
}

#[async_trait]
impl Resource for Column {
    async fn all(config: &Config) -> Result<Vec<Self>> {
        let project_id = config.require_project_id()?;
        let records = Base::new(config.clone())
            .get(
                &format!("/projects/{project_id}/columns.json"),
                RequestOptions::default(),
            )
            .await?
            .into_list()?;

        let columns = records
            .iter()
            .filter_map(|record| match Column::new(config, record) {
                Ok(column) => Some(column),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping invalid column");
                    None
                }
            })
            .collect();
        Ok(columns)
    }

    async fn find(config: &Config, id: u64) -> Result<Option<Self>> {
        Ok(Column::all(config).await?.into_iter().find(|c| c.id == id))
    }
}
