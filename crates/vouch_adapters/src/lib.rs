pub mod accounts;
pub mod configuration;
pub mod credentials;
pub mod git;
pub mod github;
pub mod gitlab;
pub mod machine;
pub mod network;
pub mod providers;
pub mod telemetry;

#[cfg(test)]
mod test_server;

// Re-exports for convenience
pub use accounts::FileCredentialRepository;
pub use credentials::KeyringSecretStore;
pub use git::GitCli;
pub use machine::SystemMachineIdentity;
pub use providers::HttpProviderFactory;
