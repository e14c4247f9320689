//! Auth state shared by the CLI and the gateway. Holds the signed-in user as
//! a watch channel so observers see login and logout as they happen; the
//! tokens themselves stay in the [`SessionStore`](crate::session::SessionStore).

pub mod state;

pub use state::{AuthSnapshot, AuthState};
