//! # Order Client
//!
//! Typed access to the remote `orders` collection. Writes pass the collection's access rules
//! first; reads decode documents into [`Order`]s and reject the ones that do not decode.
use super::rules::{check_order_access, Access};
use crate::document_actor::{to_fields, Document, DocumentError, FieldPatch};
use crate::model::{Identity, Order, OrderId, OrderStatus};
use crate::order_manager::OrderError;
use chrono::{DateTime, Utc};
use collection_actor::{ActorClient, FrameworkError, ResourceClient, Snapshot, Subscription};
use tracing::{debug, instrument, warn};

/// Client for the `orders` collection.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Document>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Document>) -> Self {
        Self { inner }
    }
}

impl ActorClient<Document> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Document> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => OrderError::OrderNotFound(OrderId::new(id)),
            e if e.is_unavailable() => OrderError::RemoteUnavailable(e.to_string()),
            e => OrderError::MalformedDocument(e.to_string()),
        }
    }
}

impl OrderClient {
    /// Stores a new order and returns the id the collection assigned to it.
    #[instrument(skip(self, caller, order), fields(customer = %order.customer_id))]
    pub async fn create_order(
        &self,
        caller: Option<&Identity>,
        order: &Order,
    ) -> Result<OrderId, OrderError> {
        check_order_access(Access::Create, caller)?;
        let fields =
            to_fields(order).map_err(|e| OrderError::MalformedDocument(e.to_string()))?;
        debug!("Sending request");
        self.inner
            .create(fields)
            .await
            .map(OrderId::new)
            .map_err(Self::map_error)
    }

    /// Reads one order. A document that no longer decodes counts as an error, not as absent.
    #[instrument(skip(self))]
    pub async fn find_order(&self, id: &OrderId) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        match self.get(id.to_string()).await? {
            Some(doc) => decode_order(&doc)
                .map(Some)
                .map_err(|e| OrderError::MalformedDocument(e.to_string())),
            None => Ok(None),
        }
    }

    /// Writes `status` and `updatedAt`; every other field is left as stored.
    #[instrument(skip(self, caller))]
    pub async fn set_status(
        &self,
        caller: Option<&Identity>,
        id: &OrderId,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        check_order_access(Access::Update, caller)?;
        let patch = FieldPatch::new()
            .set("status", status.as_str())
            .set("updatedAt", at.to_rfc3339());
        debug!("Sending request");
        self.inner
            .update(id.to_string(), patch)
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    #[instrument(skip(self, caller))]
    pub async fn delete_order(
        &self,
        caller: Option<&Identity>,
        id: &OrderId,
    ) -> Result<(), OrderError> {
        check_order_access(Access::Delete, caller)?;
        debug!("Sending request");
        self.inner
            .delete(id.to_string())
            .await
            .map_err(Self::map_error)
    }

    /// Live feed of raw order documents.
    pub fn subscribe_documents(&self) -> Subscription<Document> {
        self.subscribe()
    }
}

/// Decodes and validates one order document.
pub fn decode_order(doc: &Document) -> Result<Order, DocumentError> {
    let mut order: Order = doc.decode()?;
    order.validate().map_err(|reason| DocumentError::Malformed {
        id: doc.id.clone(),
        reason,
    })?;
    order.id = OrderId::new(doc.id.clone());
    Ok(order)
}

/// Every decodable order in a snapshot, newest first. Malformed documents are logged and skipped.
pub fn orders_from_snapshot(snapshot: &Snapshot<Document>) -> Vec<Order> {
    let mut orders: Vec<Order> = snapshot
        .items
        .iter()
        .filter_map(|doc| match decode_order(doc) {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(id = %doc.id, error = %e, "Skipping malformed order");
                None
            }
        })
        .collect();
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    orders
}
