//! CrudService: generic CRUD using the safe SQL builder.

mod crud;
mod patch;
mod validation;
pub use crud::CrudService;
pub use patch::merge_patch;
pub use validation::RequestValidator;
