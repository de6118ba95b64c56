mod f_anonym;
mod f_bearer;

pub use f_anonym::anonym;
pub use f_bearer::{fetch_user, try_bearer, AuthCache};
