//! Client library for the Kanbanery REST API.
//!
//! Every resource call is a single authenticated HTTP round trip against
//! `https://{workspace}.kanbanery.com/api/v1`.
//!
//! ```no_run
//! use kanbantastic::{Column, Config, Resource, Task, TaskParams};
//!
//! # async fn example() -> kanbantastic::Result<()> {
//! let config = Config::new("api-token", "envision", Some(2817));
//!
//! let mut task = Task::create(&config, TaskParams::new("Write docs", "Work Package")).await?;
//! task.move_to_next_column().await?;
//!
//! for column in Column::all(&config).await? {
//!     println!("{} {}", column.position, column.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod config;
pub mod error;
pub mod model;
pub mod util;

pub use base::{invalid_response_error, Base, Payload, Record, RequestOptions};
pub use config::Config;
pub use error::{Error, Result};
pub use model::column::Column;
pub use model::task::{Location, Task, TaskParams};
pub use model::user::User;
pub use model::Resource;
