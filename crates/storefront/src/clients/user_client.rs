//! # User Client
//!
//! Typed access to the remote `users` collection, keyed by identity id.
use crate::document_actor::{to_fields, Document, FieldPatch};
use crate::identity_actor::IdentityError;
use crate::model::{Role, UserId, UserRecord};
use collection_actor::{ActorClient, FrameworkError, ResourceClient};
use tracing::{debug, instrument, warn};

/// Client for the `users` collection.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<Document>,
}

impl UserClient {
    pub fn new(inner: ResourceClient<Document>) -> Self {
        Self { inner }
    }
}

impl ActorClient<Document> for UserClient {
    type Error = IdentityError;

    fn inner(&self) -> &ResourceClient<Document> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(uid) => IdentityError::UserNotFound(uid),
            other => IdentityError::RemoteUnavailable(other.to_string()),
        }
    }
}

fn decode_record(doc: &Document) -> Result<UserRecord, IdentityError> {
    doc.decode().map_err(|e| IdentityError::MalformedRecord {
        uid: doc.id.clone(),
        reason: e.to_string(),
    })
}

impl UserClient {
    #[instrument(skip(self))]
    pub async fn fetch_record(&self, uid: &UserId) -> Result<Option<UserRecord>, IdentityError> {
        debug!("Sending request");
        match self.get(uid.to_string()).await? {
            Some(doc) => decode_record(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Writes (or overwrites) the record under its uid.
    #[instrument(skip(self, record), fields(uid = %record.uid))]
    pub async fn put_record(&self, record: &UserRecord) -> Result<(), IdentityError> {
        let fields = to_fields(record).map_err(|e| IdentityError::MalformedRecord {
            uid: record.uid.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Sending request");
        self.inner
            .put(record.uid.to_string(), fields)
            .await
            .map_err(Self::map_error)
    }

    /// Looks a record up by e-mail address, ignoring case. Malformed records are skipped.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        debug!("Sending request");
        let docs = self.list().await?;
        let wanted = email.trim();
        Ok(docs
            .iter()
            .filter_map(|doc| match decode_record(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "Skipping malformed user record");
                    None
                }
            })
            .find(|record| record.email.eq_ignore_ascii_case(wanted)))
    }

    #[instrument(skip(self))]
    pub async fn set_role(&self, uid: &UserId, role: Role) -> Result<UserRecord, IdentityError> {
        debug!("Sending request");
        let doc = self
            .inner
            .update(uid.to_string(), FieldPatch::new().set("role", role.as_str()))
            .await
            .map_err(Self::map_error)?;
        decode_record(&doc)
    }
}
