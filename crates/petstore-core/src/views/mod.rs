//! View state for the list and detail pages.
//!
//! Rendering is left to the front end; these types hold what a page shows and
//! apply load results in the order the user asked for them.

mod pet_detail;
mod pet_list;
#[cfg(test)]
mod test_support;

pub use pet_detail::{
    build_update, fetch_pet, validate, FormErrors, FormField, PetDetailView, PetForm, SaveOutcome,
};
pub use pet_list::{dedupe_by_id, fetch_pets, PetListView};
