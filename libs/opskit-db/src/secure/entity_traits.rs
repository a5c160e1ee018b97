use sea_orm::EntityTrait;

/// Columns the listing layer needs to know about.
///
/// Tenant and owner columns are named by the resource's `OwnershipPolicy`.
///
/// ```rust,ignore
/// impl ScopableEntity for brand::Entity {
///     fn resource_col() -> Self::Column { Column::Id }
///     fn deleted_at_col() -> Option<Self::Column> { Some(Column::DeletedAt) }
/// }
/// ```
pub trait ScopableEntity: EntityTrait {
    /// Primary key column, also the pagination tiebreaker.
    fn resource_col() -> Self::Column;

    /// Soft-delete marker. Rows with a non-null value are hidden by default.
    fn deleted_at_col() -> Option<Self::Column>;
}
