//! In-memory cloud backed by an optional JSON fixture.
//!
//! This provider simulates the remote side for local runs and tests. Every
//! call is recorded so callers can assert on the exact sequence of
//! mutations the engine issued.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{ConvergeError, ProviderError, Result};

use super::types::{CreateRequest, DescribeRequest, RemoteObject, ResourceKind, Tags};
use super::{CloudProvider, ProviderResult};

/// Serialized form of the simulated cloud.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudFixture {
    /// Every remote object.
    #[serde(default)]
    pub objects: Vec<RemoteObject>,
    /// Counter for generated identifiers.
    #[serde(default)]
    pub next_id: u64,
}

/// A provider call as observed by the in-memory cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A describe call.
    Describe {
        /// Kind described.
        kind: ResourceKind,
    },
    /// A create call.
    Create {
        /// Kind created.
        kind: ResourceKind,
        /// Identifier returned.
        id: String,
    },
    /// An attach call.
    Attach {
        /// Kind of the child.
        kind: ResourceKind,
        /// Parent identifier.
        parent_id: String,
        /// Child identifier.
        child_id: String,
    },
    /// A tag call.
    Tag {
        /// Identifier tagged.
        id: String,
    },
}

/// In-memory cloud provider.
#[derive(Debug, Default)]
pub struct InMemoryCloud {
    /// Remote state.
    fixture: Mutex<CloudFixture>,
    /// Call log.
    calls: Mutex<Vec<RecordedCall>>,
}

impl InMemoryCloud {
    /// Creates an empty cloud.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cloud seeded with the given objects.
    #[must_use]
    pub fn with_objects(objects: Vec<RemoteObject>) -> Self {
        Self::from_fixture(CloudFixture {
            objects,
            next_id: 0,
        })
    }

    /// Creates a cloud from a fixture.
    #[must_use]
    pub fn from_fixture(fixture: CloudFixture) -> Self {
        Self {
            fixture: Mutex::new(fixture),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Loads a cloud from a JSON fixture file. A missing file yields an empty cloud.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !fs::try_exists(path).await? {
            debug!("Fixture not found at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).await?;
        let fixture: CloudFixture = serde_json::from_str(&content).map_err(|e| {
            ConvergeError::internal(format!("Invalid fixture {}: {e}", path.display()))
        })?;

        info!(
            "Loaded {} remote objects from {}",
            fixture.objects.len(),
            path.display()
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Saves the current remote state to a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ConvergeError::internal(format!("Failed to serialize fixture: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, content).await?;

        debug!("Saved fixture to {}", path.display());
        Ok(())
    }

    /// Returns a copy of the remote state.
    #[must_use]
    pub fn snapshot(&self) -> CloudFixture {
        self.state().clone()
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log().clone()
    }

    /// Returns only the mutating calls received so far.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedCall> {
        self.log()
            .iter()
            .filter(|c| !matches!(c, RecordedCall::Describe { .. }))
            .cloned()
            .collect()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        self.log().clear();
    }

    /// Gets a remote object by identifier.
    #[must_use]
    pub fn object(&self, id: &str) -> Option<RemoteObject> {
        self.state().objects.iter().find(|o| o.id == id).cloned()
    }

    fn state(&self) -> MutexGuard<'_, CloudFixture> {
        self.fixture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: RecordedCall) {
        self.log().push(call);
    }
}

#[async_trait]
impl CloudProvider for InMemoryCloud {
    async fn describe(
        &self,
        kind: ResourceKind,
        request: &DescribeRequest,
    ) -> ProviderResult<Vec<RemoteObject>> {
        self.record(RecordedCall::Describe { kind });

        let matches: Vec<RemoteObject> = self
            .state()
            .objects
            .iter()
            .filter(|o| o.kind == kind && request.matches(o))
            .cloned()
            .collect();

        debug!("Describe {kind}: {} matches", matches.len());
        Ok(matches)
    }

    async fn create(&self, request: &CreateRequest) -> ProviderResult<String> {
        let id = {
            let mut state = self.state();
            state.next_id += 1;
            let id = format!("{}-{:08x}", request.kind.id_prefix(), state.next_id);

            state.objects.push(RemoteObject {
                id: id.clone(),
                kind: request.kind,
                tags: request.tags.clone(),
                attachments: Vec::new(),
                properties: request.properties.clone(),
            });
            id
        };

        self.record(RecordedCall::Create {
            kind: request.kind,
            id: id.clone(),
        });
        Ok(id)
    }

    async fn attach(
        &self,
        kind: ResourceKind,
        parent_id: &str,
        child_id: &str,
    ) -> ProviderResult<()> {
        self.record(RecordedCall::Attach {
            kind,
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
        });

        let mut state = self.state();

        if !state.objects.iter().any(|o| o.id == parent_id) {
            return Err(ProviderError::NotFound {
                id: parent_id.to_string(),
            });
        }

        let child = state
            .objects
            .iter_mut()
            .find(|o| o.id == child_id && o.kind == kind)
            .ok_or_else(|| ProviderError::NotFound {
                id: child_id.to_string(),
            })?;

        match child.attachments.first() {
            Some(existing) if existing == parent_id => Ok(()),
            Some(existing) => Err(ProviderError::api_error(
                400,
                format!("{child_id} is already attached to {existing}"),
            )),
            None => {
                child.attachments.push(parent_id.to_string());
                Ok(())
            }
        }
    }

    async fn tag(&self, id: &str, tags: &Tags) -> ProviderResult<()> {
        self.record(RecordedCall::Tag { id: id.to_string() });

        let mut state = self.state();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ProviderError::NotFound { id: id.to_string() })?;

        for (key, value) in tags {
            object.tags.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
