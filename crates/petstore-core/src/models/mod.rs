//! Data types exchanged with the Petstore service.

mod pet;
mod user;

pub use pet::{
    first_photo_or_fallback, is_http_url, Category, Pet, PetStatus, Tag, UnknownStatus,
    FALLBACK_IMAGE,
};
pub use user::{LoginResponse, NewUser, SignupRequest, USER_STATUS_ACTIVE};
