use std::marker::PhantomData;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};

use crate::secure::cond::build_scope_condition;
use crate::secure::error::ScopeError;
use crate::secure::{AccessScope, ScopableEntity};

/// Typestate marker: no scope applied yet, cannot execute.
#[derive(Debug, Clone, Copy)]
pub struct Unscoped;

/// Typestate marker: scope applied, may execute.
#[derive(Debug, Clone, Copy)]
pub struct Scoped;

/// `sea_orm::Select` that only executes once scoped.
#[must_use]
#[derive(Clone, Debug)]
pub struct SecureSelect<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::Select<E>,
    pub(crate) _state: PhantomData<S>,
}

pub trait SecureEntityExt<E: EntityTrait>: Sized {
    /// Wrap this select; call `.scope_with()` before executing.
    fn secure(self) -> SecureSelect<E, Unscoped>;
}

impl<E> SecureEntityExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
{
    fn secure(self) -> SecureSelect<E, Unscoped> {
        SecureSelect {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> SecureSelect<E, Unscoped>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    /// Apply the scope predicate, transitioning to `Scoped`.
    ///
    /// # Errors
    /// See [`build_scope_condition`].
    pub fn scope_with(self, scope: &AccessScope) -> Result<SecureSelect<E, Scoped>, ScopeError> {
        let cond = build_scope_condition::<E>(scope)?;
        Ok(SecureSelect {
            inner: self.inner.filter(cond),
            _state: PhantomData,
        })
    }
}

impl<E> SecureSelect<E, Scoped>
where
    E: EntityTrait,
{
    /// # Errors
    /// Returns `ScopeError::Db` if the query fails.
    pub async fn all<C>(self, conn: &C) -> Result<Vec<E::Model>, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        Ok(self.inner.all(conn).await?)
    }

    /// # Errors
    /// Returns `ScopeError::Db` if the query fails.
    pub async fn one<C>(self, conn: &C) -> Result<Option<E::Model>, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        Ok(self.inner.one(conn).await?)
    }

    /// # Errors
    /// Returns `ScopeError::Db` if the query fails.
    pub async fn count<C>(self, conn: &C) -> Result<u64, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
        E::Model: sea_orm::FromQueryResult + Send + Sync,
    {
        Ok(self.inner.count(conn).await?)
    }

    /// Narrow to a single primary key.
    pub fn and_id(self, id: uuid::Uuid) -> Self
    where
        E: ScopableEntity,
        E::Column: ColumnTrait + Copy,
    {
        let cond = sea_orm::Condition::all().add(Expr::col((E::default(), E::resource_col())).eq(id));
        self.filter(cond)
    }

    /// Hide soft-deleted rows. No-op for entities without a marker.
    pub fn exclude_deleted(self) -> Self
    where
        E: ScopableEntity,
        E::Column: ColumnTrait + Copy,
    {
        match E::deleted_at_col() {
            Some(col) => {
                self.filter(sea_orm::Condition::all().add(Expr::col((E::default(), col)).is_null()))
            }
            None => self,
        }
    }

    pub fn filter(mut self, filter: sea_orm::Condition) -> Self {
        self.inner = QueryFilter::filter(self.inner, filter);
        self
    }

    pub fn order_by<C>(mut self, col: C, order: sea_orm::Order) -> Self
    where
        C: sea_orm::IntoSimpleExpr,
    {
        self.inner = QueryOrder::order_by(self.inner, col, order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.inner = QuerySelect::limit(self.inner, limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.inner = QuerySelect::offset(self.inner, offset);
        self
    }

    /// Escape hatch for joins and custom projections.
    ///
    /// Callers must keep the scope predicate in place.
    #[must_use]
    pub fn into_inner(self) -> sea_orm::Select<E> {
        self.inner
    }
}
