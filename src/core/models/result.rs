//! Task results and their opaque payloads

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::{FileCopyEnvelope, Status};

/// Object-safe view of a payload value
///
/// Implemented for every `Serialize + Debug` type, so producers never
/// implement it by hand.
pub trait PayloadValue: Any + fmt::Debug + Send + Sync {
    /// Render the payload for the JSON report
    fn to_json(&self) -> serde_json::Value;

    /// Access the concrete value for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl<T> PayloadValue for T
where
    T: Any + Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Task-defined data handed to downstream tasks
///
/// The shape is a private contract between a producer and its consumers;
/// consumers recover it with [`Payload::downcast_ref`].
#[derive(Debug, Clone)]
pub struct Payload(Arc<dyn PayloadValue>);

impl Payload {
    /// Wrap a value
    #[must_use]
    pub fn new<T: PayloadValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the value as `T`, if that is what it holds
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// JSON rendering for reports
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.0.to_json()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Outcome of one task execution
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskResult {
    /// Outcome category
    pub status: Status,
    /// Customer facing summary
    pub summary: String,
    /// Documentation link for this check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Data for downstream tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// Files to include in the output bundle
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files_to_copy: Vec<FileCopyEnvelope>,
}

impl TaskResult {
    /// A result with a status and summary
    #[must_use]
    pub fn new(status: Status, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// The check did not apply or could not run
    #[must_use]
    pub fn none(summary: impl Into<String>) -> Self {
        Self::new(Status::None, summary)
    }

    /// Information was collected
    #[must_use]
    pub fn info(summary: impl Into<String>) -> Self {
        Self::new(Status::Info, summary)
    }

    /// The host passed this check
    #[must_use]
    pub fn success(summary: impl Into<String>) -> Self {
        Self::new(Status::Success, summary)
    }

    /// The host looks suspicious
    #[must_use]
    pub fn warning(summary: impl Into<String>) -> Self {
        Self::new(Status::Warning, summary)
    }

    /// The host failed this check
    #[must_use]
    pub fn failure(summary: impl Into<String>) -> Self {
        Self::new(Status::Failure, summary)
    }

    /// The check itself broke
    #[must_use]
    pub fn error(summary: impl Into<String>) -> Self {
        Self::new(Status::Error, summary)
    }

    /// Attach a payload
    #[must_use]
    pub fn with_payload<T: PayloadValue>(mut self, payload: T) -> Self {
        self.payload = Some(Payload::new(payload));
        self
    }

    /// Attach a documentation URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach files for the bundle
    #[must_use]
    pub fn with_files(mut self, files: Vec<FileCopyEnvelope>) -> Self {
        self.files_to_copy = files;
        self
    }

    /// Borrow the payload as `T`
    #[must_use]
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.downcast_ref::<T>())
    }

    /// Whether downstream tasks can expect a usable payload
    ///
    /// Warnings count: they frequently still carry data.
    #[must_use]
    pub const fn has_payload(&self) -> bool {
        !matches!(self.status, Status::None | Status::Error | Status::Failure)
    }
}
