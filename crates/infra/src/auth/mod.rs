//! Identity provider access for Microsoft Graph
//!
//! Two grants are supported: client credentials for unattended runs and the
//! device authorization grant for a signed-in user. [`GraphSession`] caches
//! whichever token was obtained for the lifetime of the process.

mod credential;
mod session;
mod types;

pub use credential::{
    credential_for, ClientSecretCredential, Credential, DeviceCodeCredential, DevicePrompt,
};
pub use session::GraphSession;
pub use types::TokenSet;
