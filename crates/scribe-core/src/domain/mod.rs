//! Domain entities - the core business objects.

mod picture;
mod post;
mod user;

pub use picture::{ImageKind, ProfilePicture};
pub use post::Post;
pub use user::{DEFAULT_PROFILE_PICTURE, PROFILE_PICTURE_ROUTE, User, mask_email, normalize_email};
