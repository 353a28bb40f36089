pub mod column;
pub mod task;
pub mod user;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;

/// Collection lookups shared by the resources that live under a project.
#[async_trait]
pub trait Resource: Sized {
    /// Every valid entity of the project, in server order.
    async fn all(config: &Config) -> Result<Vec<Self>>;

    async fn find(config: &Config, id: u64) -> Result<Option<Self>>;
}
