//! Client (buyer) reference-data CRUD.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::client::{self, Entity as ClientEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::handlers::common::PaginationParams;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "Client name is required"))]
    pub name: String,
    pub gstin: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub gstin: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct ClientService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_client(
        &self,
        request: CreateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let model = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            gstin: Set(request.gstin),
            phone: Set(request.phone),
            country: Set(request.country),
            address: Set(request.address),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let created = model.insert(&*self.db).await?;
        info!(client_id = %created.id, "client created");
        if let Some(sender) = &self.event_sender {
            sender
                .send(Event::ClientCreated {
                    client_id: created.id,
                })
                .await;
        }
        Ok(created)
    }

    pub async fn get_client(&self, client_id: Uuid) -> Result<client::Model, ServiceError> {
        ClientEntity::find_by_id(client_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("client {client_id} not found")))
    }

    #[instrument(skip(self, request), fields(client_id = %client_id))]
    pub async fn update_client(
        &self,
        client_id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let model = self.get_client(client_id).await?;
        let mut active = model.into_active_model();
        if let Some(name) = request.name {
            if name.is_empty() {
                return Err(ServiceError::Validation("client name cannot be empty".into()));
            }
            active.name = Set(name);
        }
        if let Some(gstin) = request.gstin {
            active.gstin = Set(Some(gstin));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(country) = request.country {
            active.country = Set(Some(country));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(&*self.db).await?)
    }

    /// Clients are plain reference data; invoices keep denormalized copies,
    /// so deleting one never orphans an issued gate pass.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub async fn delete_client(&self, client_id: Uuid) -> Result<(), ServiceError> {
        let result = ClientEntity::delete_by_id(client_id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "client {client_id} not found"
            )));
        }
        if let Some(sender) = &self.event_sender {
            sender.send(Event::ClientDeleted { client_id }).await;
        }
        Ok(())
    }

    pub async fn list_clients(
        &self,
        pagination: &PaginationParams,
    ) -> Result<(Vec<client::Model>, u64), ServiceError> {
        let paginator = ClientEntity::find()
            .order_by_asc(client::Column::Name)
            .paginate(&*self.db, pagination.per_page);
        let total = paginator.num_items().await?;
        let clients = paginator.fetch_page(pagination.page.saturating_sub(1)).await?;
        Ok((clients, total))
    }
}
