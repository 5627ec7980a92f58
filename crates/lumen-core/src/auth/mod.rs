//! Authentication: device login and credential storage.
//!
//! - **types**: credential record and device-authorization wire types
//! - **store**: the on-disk credential file
//! - **transport**: HTTP boundary to the auth service
//! - **device**: the device-authorization polling state machine

pub mod device;
pub mod store;
pub mod transport;
pub mod types;

pub use device::{DeviceAuthPoller, DevicePoll, PollProgress, PollState, SLOW_DOWN_STEP};
pub use store::TokenStore;
pub use transport::{AuthTransport, HttpAuthTransport};
pub use types::{Credential, DeviceAuthorization, PollResponse, TokenResponse, UserInfo};
