use std::marker::PhantomData;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::secure::cond::build_scope_condition;
use crate::secure::error::ScopeError;
use crate::secure::{AccessScope, ScopableEntity, Scoped, Unscoped};

/// `sea_orm::UpdateMany` that only executes once scoped.
#[must_use]
#[derive(Clone, Debug)]
pub struct SecureUpdateMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::UpdateMany<E>,
    pub(crate) _state: PhantomData<S>,
}

pub trait SecureUpdateExt<E: EntityTrait>: Sized {
    fn secure(self) -> SecureUpdateMany<E, Unscoped>;
}

impl<E> SecureUpdateExt<E> for sea_orm::UpdateMany<E>
where
    E: EntityTrait,
{
    fn secure(self) -> SecureUpdateMany<E, Unscoped> {
        SecureUpdateMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> SecureUpdateMany<E, Unscoped>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    /// # Errors
    /// See [`build_scope_condition`].
    pub fn scope_with(self, scope: &AccessScope) -> Result<SecureUpdateMany<E, Scoped>, ScopeError> {
        let cond = build_scope_condition::<E>(scope)?;
        Ok(SecureUpdateMany {
            inner: self.inner.filter(cond),
            _state: PhantomData,
        })
    }
}

impl<E> SecureUpdateMany<E, Scoped>
where
    E: EntityTrait,
{
    /// # Errors
    /// Returns `ScopeError::Db` if the statement fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::UpdateResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }
}

/// `sea_orm::DeleteMany` that only executes once scoped.
#[must_use]
#[derive(Clone, Debug)]
pub struct SecureDeleteMany<E: EntityTrait, S> {
    pub(crate) inner: sea_orm::DeleteMany<E>,
    pub(crate) _state: PhantomData<S>,
}

pub trait SecureDeleteExt<E: EntityTrait>: Sized {
    fn secure(self) -> SecureDeleteMany<E, Unscoped>;
}

impl<E> SecureDeleteExt<E> for sea_orm::DeleteMany<E>
where
    E: EntityTrait,
{
    fn secure(self) -> SecureDeleteMany<E, Unscoped> {
        SecureDeleteMany {
            inner: self,
            _state: PhantomData,
        }
    }
}

impl<E> SecureDeleteMany<E, Unscoped>
where
    E: ScopableEntity + EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    /// # Errors
    /// See [`build_scope_condition`].
    pub fn scope_with(self, scope: &AccessScope) -> Result<SecureDeleteMany<E, Scoped>, ScopeError> {
        let cond = build_scope_condition::<E>(scope)?;
        Ok(SecureDeleteMany {
            inner: self.inner.filter(cond),
            _state: PhantomData,
        })
    }
}

impl<E> SecureDeleteMany<E, Scoped>
where
    E: EntityTrait,
{
    /// # Errors
    /// Returns `ScopeError::Db` if the statement fails.
    pub async fn exec<C: ConnectionTrait + Send + Sync>(
        self,
        conn: &C,
    ) -> Result<sea_orm::DeleteResult, ScopeError> {
        Ok(self.inner.exec(conn).await?)
    }
}
