use std::sync::Arc;
use crate::{
    auth::TokenVerifier,
    config::Settings,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        service_context: Arc<ServiceContext>,
        token_verifier: Arc<dyn TokenVerifier>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            service_context,
            token_verifier,
            settings,
        }
    }
}
