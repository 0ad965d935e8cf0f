// Adapters - External system implementations

pub mod local_source;
#[cfg(unix)]
pub mod mpv_ipc;
pub mod process_tokio;
pub mod toml_config;
pub mod upload_curl;

// Re-export adapters
pub use local_source::LocalSourceAdapter;
#[cfg(unix)]
pub use mpv_ipc::MpvIpcAdapter;
pub use process_tokio::TokioProcessRunner;
pub use toml_config::TomlConfigAdapter;
pub use upload_curl::CurlUploadAdapter;
