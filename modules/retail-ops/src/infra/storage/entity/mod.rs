//! SeaORM entities. Every table carries a uuid `id` and a `project_id`
//! (projects scope on their own `id`).

pub mod brand;
pub mod category;
pub mod feedback;
pub mod location;
pub mod product;
pub mod project;
pub mod survey;
pub mod user;
