/// 課金機能のモジュール
pub mod models;
pub mod service;

pub use models::{CheckoutSession, PlanTier, PRO_FEATURES};
pub use service::BillingService;
