mod branch_sync;
mod create_version;
mod login;

pub use branch_sync::BranchSyncUseCase;
pub use create_version::{CreateVersionUseCase, ReleaseOptions, ReleaseReport};
pub use login::{normalize_owners, LoginRequest, LoginUseCase};
