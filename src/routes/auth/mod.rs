mod handler;
mod model;

pub use handler::{logout, me, signin};
pub use model::{LogoutResponse, SignInRequest, SignInResponse, UserProfile};
