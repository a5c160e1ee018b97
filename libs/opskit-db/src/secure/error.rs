/// Errors raised while building or running a scoped statement.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// The scope names a field that is not a column of the entity.
    #[error("scope field '{field}' is not a column of '{table}'")]
    UnknownField { field: String, table: String },

    #[error("invalid scope: {0}")]
    Invalid(String),
}
