use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::column::Column;
use super::user::{Member, User};
use super::Resource;
use crate::base::{invalid_response_error, Base, Payload, Record, RequestOptions};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::util::time::parse_timestamp;

const UNABLE_TO_UPDATE: &str = "Unable to update task.";
const UNABLE_TO_CREATE: &str = "Unable to create task.";

/// Relative placement understood by the task update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    NextColumn,
    PrevColumn,
    Archive,
}

/// Fields sent as `{"task": {...}}` on create and update. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    /// `Some(None)` sends an explicit `null`, letting the server pick the slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl TaskParams {
    pub fn new(title: impl Into<String>, task_type_name: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            task_type_name: Some(task_type_name.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn owner_id(mut self, owner_id: u64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn column_id(mut self, column_id: u64) -> Self {
        self.column_id = Some(column_id);
        self
    }

    pub fn clear_position(mut self) -> Self {
        self.position = Some(None);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

#[derive(Deserialize)]
struct TaskType {
    id: u64,
    name: String,
}

/// A work item on the board.
///
/// Column, owner and task-type lookups are memoized on the value itself and
/// live exactly as long as it does.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub column_id: Option<u64>,
    pub task_type_id: Option<u64>,
    pub owner_id: Option<u64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub moved_at: Option<DateTime<Utc>>,
    pub position: Option<u32>,
    base: Base,
    columns: HashMap<u64, Column>,
    owner: Option<(u64, User)>,
    task_type_ids: HashMap<String, u64>,
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Task {
    /// Build a task from a record. A `task_type_name` without a
    /// `task_type_id` is resolved through the project's task types.
    pub async fn new(config: &Config, record: &Record) -> Result<Self> {
        let mut task = Self {
            id: None,
            title: None,
            column_id: None,
            task_type_id: None,
            owner_id: None,
            updated_at: None,
            created_at: None,
            moved_at: None,
            position: None,
            base: Base::new(config.clone()),
            columns: HashMap::new(),
            owner: None,
            task_type_ids: HashMap::new(),
        };
        task.assign_attributes(record);

        if task.task_type_id.is_none() {
            if let Some(name) = record.get("task_type_name").and_then(Value::as_str) {
                task.task_type_id = task.find_task_type_id(name).await?;
            }
        }
        Ok(task)
    }

    pub fn config(&self) -> &Config {
        self.base.config()
    }

    /// Copy known task fields out of `record`; other keys are ignored.
    pub fn assign_attributes(&mut self, record: &Record) -> &mut Self {
        for (key, value) in record {
            match key.as_str() {
                "id" => self.id = value.as_u64(),
                "title" => self.title = value.as_str().map(String::from),
                "column_id" => self.column_id = value.as_u64(),
                "task_type_id" => self.task_type_id = value.as_u64(),
                "owner_id" => self.owner_id = value.as_u64(),
                "updated_at" => self.updated_at = parse_timestamp(value),
                "created_at" => self.created_at = parse_timestamp(value),
                "moved_at" => self.moved_at = parse_timestamp(value),
                "position" => {
                    self.position = value.as_u64().and_then(|p| u32::try_from(p).ok())
                }
                _ => {}
            }
        }
        self
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.id.is_none() {
            missing.push("id");
        }
        if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            missing.push("title");
        }
        if self.column_id.is_none() {
            missing.push("column_id");
        }
        if self.updated_at.is_none() {
            missing.push("updated_at");
        }
        if self.task_type_id.is_none() {
            missing.push("task_type_id");
        }
        missing
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
                entity: "task",
                missing,
            })
        }
    }

    /// Numeric id of a task type by name. Blank or unknown names yield `None`.
    pub async fn find_task_type_id(&mut self, task_type_name: &str) -> Result<Option<u64>> {
        if task_type_name.trim().is_empty() {
            return Ok(None);
        }
        if let Some(id) = self.task_type_ids.get(task_type_name) {
            return Ok(Some(*id));
        }

        let project_id = self.base.config().require_project_id()?;
        let payload = self
            .base
            .get(
                &format!("/projects/{project_id}/task_types.json"),
                RequestOptions::default(),
            )
            .await?;
        let task_types: Vec<TaskType> = serde_json::from_value(payload.into_value())?;

        let id = task_types
            .into_iter()
            .find(|t| t.name == task_type_name)
            .map(|t| t.id);
        if let Some(id) = id {
            self.task_type_ids.insert(task_type_name.to_string(), id);
        }
        Ok(id)
    }

    pub async fn create(config: &Config, params: TaskParams) -> Result<Self> {
        let present =
            |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !present(&params.title) || !present(&params.task_type_name) {
            return Err(Error::Rule(
                "Kanbanery task can't be created without title and task_type_name.".into(),
            ));
        }

        let project_id = config.require_project_id()?;
        let body = serde_json::json!({ "task": serde_json::to_value(&params)? });
        let record = Base::new(config.clone())
            .post(
                &format!("/projects/{project_id}/tasks.json"),
                RequestOptions::body(body),
            )
            .await?
            .into_object()?;

        let task = Task::new(config, &record).await?;
        if task.is_valid() {
            tracing::debug!(id = ?task.id, "created kanbanery task");
            Ok(task)
        } else {
            Err(invalid_response_error(UNABLE_TO_CREATE, &Value::Object(record)))
        }
    }

    /// Send `params` to the server and take over every attribute it returns.
    /// Returns whether the task is valid afterwards.
    pub async fn update(&mut self, mut params: TaskParams) -> Result<bool> {
        // Keep the current owner unless the caller picked one
        if params.owner_id.is_none() {
            params.owner_id = self.owner_id;
        }
        let Some(id) = self.id else {
            return Err(Error::InvalidResponse(format!(
                "{UNABLE_TO_UPDATE} Task has no id."
            )));
        };

        let body = serde_json::json!({ "task": serde_json::to_value(&params)? });
        let payload = match self
            .base
            .put(&format!("/tasks/{id}.json"), RequestOptions::body(body))
            .await
        {
            Ok(payload) => payload,
            // Rejected by the server, report its field messages
            Err(Error::Status { status, body, .. }) => {
                return Err(invalid_response_error(
                    &format!("{UNABLE_TO_UPDATE} {status}"),
                    &body.unwrap_or(Value::Null),
                ))
            }
            // Transport or decode failure
            Err(e) => {
                return Err(Error::InvalidResponse(format!("{UNABLE_TO_UPDATE} {e}")));
            }
        };

        // Only a task record with an id counts as an update
        match payload {
            Payload::Object(record) if record.get("id").is_some_and(|v| !v.is_null()) => {
                self.assign_attributes(&record);
                Ok(self.is_valid())
            }
            other => Err(invalid_response_error(UNABLE_TO_UPDATE, &other.into_value())),
        }
    }

    /// The column holding this task, fetched once per column id.
    pub async fn column(&mut self) -> Result<&Column> {
        let column_id = self
            .column_id
            .ok_or_else(|| Error::NotFound("task has no column".into()))?;

        match self.columns.entry(column_id) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let column = Column::find(self.base.config(), column_id)
                    .await?
                    .ok_or_else(|| Error::NotFound(format!("column {column_id} not found")))?;
                Ok(&*entry.insert(column))
            }
        }
    }

    pub async fn move_to_next_column(&mut self) -> Result<bool> {
        self.update(TaskParams::default().location(Location::NextColumn))
            .await
    }

    pub async fn move_to_previous_column(&mut self) -> Result<bool> {
        self.update(TaskParams::default().location(Location::PrevColumn))
            .await
    }

    pub async fn move_to_first_column(&mut self) -> Result<bool> {
        self.jump_to("first", |columns| columns.into_iter().next())
            .await
    }

    pub async fn move_to_second_column(&mut self) -> Result<bool> {
        self.jump_to("second", |columns| columns.into_iter().nth(1))
            .await
    }

    pub async fn move_to_last_column(&mut self) -> Result<bool> {
        self.jump_to("last", |columns| columns.into_iter().last())
            .await
    }

    async fn jump_to(
        &mut self,
        which: &str,
        pick: impl FnOnce(Vec<Column>) -> Option<Column>,
    ) -> Result<bool> {
        let columns = Column::all(self.base.config()).await?;
        let target = pick(columns)
            .ok_or_else(|| Error::NotFound(format!("project has no {which} column")))?;

        tracing::debug!(task = ?self.id, column = target.id, "moving task to {which} column");
        self.update(TaskParams::default().column_id(target.id).clear_position())
            .await
    }

    /// Archive the task. Already archived tasks are left alone.
    pub async fn archive(&mut self) -> Result<bool> {
        let Some(id) = self.id else {
            return Err(Error::InvalidResponse(format!(
                "{UNABLE_TO_UPDATE} Task has no id."
            )));
        };
        if Task::is_archived(self.base.config(), id).await? {
            return Ok(true);
        }

        let in_last_column = self.column().await?.is_last().await?;
        if !in_last_column {
            return Err(Error::Rule(
                "Kanbanery tasks can be archived only from the last column.".into(),
            ));
        }
        self.update(TaskParams::default().location(Location::Archive))
            .await
    }

    /// The task's owner, looked up in the project's member list. A task
    /// without an owner id returns `None` without touching the network.
    pub async fn owner(&mut self) -> Result<Option<&User>> {
        let Some(owner_id) = self.owner_id else {
            return Ok(None);
        };

        if !matches!(&self.owner, Some((cached, _)) if *cached == owner_id) {
            let project_id = self.base.config().require_project_id()?;
            let payload = self
                .base
                .get(
                    &format!("/projects/{project_id}/users.json"),
                    RequestOptions::default(),
                )
                .await?;
            let members: Vec<Member> = serde_json::from_value(payload.into_value())?;
            let member = members
                .into_iter()
                .find(|m| m.id == owner_id)
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "user {owner_id} is not a member of project {project_id}"
                    ))
                })?;
            self.owner = Some((owner_id, User::from(member)));
        }

        Ok(self.owner.as_ref().map(|(_, user)| user))
    }

    pub async fn is_archived(config: &Config, id: u64) -> Result<bool> {
        let project_id = config.require_project_id()?;
        let records = Base::new(config.clone())
            .get(
                &format!("/projects/{project_id}/archive/tasks.json"),
                RequestOptions::default(),
            )
            .await?
            .into_list()?;

        Ok(records
            .iter()
            .any(|record| record.get("id").and_then(Value::as_u64) == Some(id)))
    }
}

#[async_trait]
impl Resource for Task {
    async fn all(config: &Config) -> Result<Vec<Self>> {
        let project_id = config.require_project_id()?;
        let records = Base::new(config.clone())
            .get(
                &format!("/projects/{project_id}/tasks.json"),
                RequestOptions::default(),
            )
            .await?
            .into_list()?;

        let mut tasks = Vec::with_capacity(records.len());
        for record in &records {
            let task = Task::new(config, record).await?;
            if task.is_valid() {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    /// A task the server does not know about is `None`, not an error.
    async fn find(config: &Config, id: u64) -> Result<Option<Self>> {
        let payload = match Base::new(config.clone())
            .get(&format!("/tasks/{id}.json"), RequestOptions::default())
            .await
        {
            Ok(payload) => payload,
            Err(Error::Status { code: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let task = Task::new(config, &payload.into_object()?).await?;
        Ok(task.is_valid().then_some(task))
    }
}
