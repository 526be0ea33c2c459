/// 認証機能のモジュール
pub mod encryption;
pub mod models;
pub mod repository;
pub mod service;
pub mod session_store;

pub use models::{AuthState, ProviderUser, User};
pub use repository::UserRepository;
pub use service::AuthService;
pub use session_store::{SessionStore, StoredAuthInfo};
