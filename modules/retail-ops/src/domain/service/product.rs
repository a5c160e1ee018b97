use chrono::Utc;
use opskit_db::crud::{Record, RelationGraph};
use opskit_query::{FieldTypes, ListResult};
use opskit_security::{Caller, OwnershipPolicy};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{ResourceSpec, ServiceContext, default_true};
use crate::domain::error::DomainError;
use crate::domain::validation::{MAX_NAME_LEN, non_negative, required};
use crate::infra::storage::entity::{brand, category, product, project};

pub const POLICY: OwnershipPolicy = OwnershipPolicy::project("project_id");

const MAX_SKU_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    #[serde(default)]
    pub brand_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

pub struct ProductService {
    ctx: ServiceContext,
    spec: ResourceSpec<product::Entity>,
}

fn spec() -> ResourceSpec<product::Entity> {
    let graph = RelationGraph::new()
        .belongs_to::<project::Entity>("project", product::Column::ProjectId, project::Column::Id)
        .belongs_to::<brand::Entity>("brand", product::Column::BrandId, brand::Column::Id)
        .belongs_to::<category::Entity>(
            "category",
            product::Column::CategoryId,
            category::Column::Id,
        );
    ResourceSpec {
        relations: &["project", "brand", "category"],
        searchable: &["name", "sku", "brand.name"],
        field_types: FieldTypes::new()
            .boolean("in_stock")
            .integer("price_cents"),
        soft_delete: true,
        ..ResourceSpec::new("product", graph, POLICY)
    }
}

impl ProductService {
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx, spec: spec() }
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn list(
        &self,
        caller: &Caller,
        raw_query: &str,
    ) -> Result<ListResult<Record<product::Model>>, DomainError> {
        self.spec.list(&self.ctx, caller, raw_query).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn get(
        &self,
        caller: &Caller,
        id: Uuid,
    ) -> Result<Record<product::Model>, DomainError> {
        self.spec.get(&self.ctx, caller, id).await
    }

    /// # Errors
    /// See [`DomainError`].
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<(), DomainError> {
        self.spec.delete(&self.ctx, caller, id).await
    }

    /// # Errors
    /// `Validation` for blank fields, a negative price, or a brand/category
    /// the caller cannot see.
    #[instrument(skip(self, caller, new), fields(caller_id = %caller.id))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewProduct,
    ) -> Result<product::Model, DomainError> {
        let NewProduct {
            name,
            sku,
            price_cents,
            brand_id,
            category_id,
            in_stock,
        } = new;
        let project_id = self.ctx.tenant_project(caller)?;
        let name = required("name", &name, MAX_NAME_LEN)?;
        let sku = required("sku", &sku, MAX_SKU_LEN)?;
        let price_cents = non_negative("price_cents", price_cents)?;
        if let Some(id) = brand_id {
            self.ctx
                .ensure_visible::<brand::Entity>(caller, super::brand::POLICY, "brand_id", id)
                .await?;
        }
        if let Some(id) = category_id {
            self.ctx
                .ensure_visible::<category::Entity>(
                    caller,
                    super::category::POLICY,
                    "category_id",
                    id,
                )
                .await?;
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            brand_id: Set(brand_id),
            category_id: Set(category_id),
            name: Set(name),
            sku: Set(sku),
            price_cents: Set(price_cents),
            in_stock: Set(in_stock),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(self.ctx.conn())
        .await?;
        info!(product_id = %model.id, "product created");
        Ok(model)
    }
}
