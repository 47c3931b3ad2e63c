//! Multi-step booking wizard.
//!
//! Customer details are saved to the account first; cycles and terms are
//! then packaged into a multipart order submission.

pub mod reducer;
pub mod state;
pub mod submission;

pub use reducer::{validate_cycles, BookingReducer};
pub use state::{
    BookingAction, BookingState, CustomerField, CycleDraft, CycleEdit, ImageAttachment,
    WizardStep,
};
pub use submission::{build_order_form, image_file_name, slugify};
