//! Generic form renderer: dialog state machine, lookups for reference fields, control view model.

mod lookup;
mod modal;
mod render;

pub use lookup::{LookupOption, Lookups};
pub use modal::{FieldError, Modal, ModalPhase, ModalRole};
pub use render::{render_form, Control, FormView};
