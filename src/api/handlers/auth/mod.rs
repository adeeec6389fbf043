//! Login and logout in two flavours.
//!
//! Flow Overview:
//! 1) `POST /api/login` requires a username, then looks the user up with a
//!    parameterized query.
//! 2) The current auth mode picks an `AuthScheme`: the forgeable cookie, or a
//!    server-side session behind a brute-force lockout.
//! 3) `POST /api/logout` lets the current scheme clear its own cookie.

pub mod lockout;
pub mod login;
pub mod logout;
pub mod scheme;
pub mod session;
pub mod state;
pub mod types;
pub(crate) mod utils;

pub use login::login;
pub use logout::logout;
pub use state::AuthState;
