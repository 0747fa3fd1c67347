//! Capabilities every micro-app gets out of the box.

pub mod dialogs;
pub mod local_data;
pub mod micro_app_token;
pub mod scanner;
pub mod security_audit;
pub mod session_info;

use super::registry::CapabilityRegistry;
use crate::domain::bridge::CoreTopic;

pub fn register_core_capabilities(registry: &mut CapabilityRegistry) {
    registry.register_fn(CoreTopic::Token, session_info::token);
    registry.register_fn(CoreTopic::UserId, session_info::user_id);
    registry.register_fn(CoreTopic::QrRequest, scanner::qr_request);
    registry.register_fn(CoreTopic::QrClose, scanner::qr_close);
    registry.register_fn(CoreTopic::Alert, dialogs::alert);
    registry.register_fn(CoreTopic::ConfirmAlert, dialogs::confirm_alert);
    registry.register_fn(CoreTopic::SaveLocalData, local_data::save);
    registry.register_fn(CoreTopic::GetLocalData, local_data::get);
    registry.register_fn(CoreTopic::MicroAppToken, micro_app_token::micro_app_token);
    registry.register_fn(CoreTopic::SecurityAudit, security_audit::security_audit);
}

pub fn core_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    register_core_capabilities(&mut registry);
    registry
}
