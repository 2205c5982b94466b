/// Locally persisted prediction draft.
pub mod draft;
/// Remote document-store abstraction and its backends.
pub mod event_store;
/// Entities shared across storage backends and services.
pub mod models;
/// Backend-agnostic storage errors.
pub mod storage;
