pub mod extract;
pub mod password;
pub mod store;
pub mod types;

pub use extract::{CurrentUser, SessionToken};
pub use store::UserStore;
pub use types::{LoginRequest, Profile, SignupRequest, TokenResponse, User};
