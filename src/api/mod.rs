pub mod rest;
pub mod ws;

use std::sync::Arc;

use axum::extract::FromRef;

use crate::app_state::AppState;
use crate::dashboard::DashboardController;

/// Router state; handlers extract whichever half they need.
#[derive(Clone)]
pub struct ApiState {
    pub app: Arc<AppState>,
    pub controller: DashboardController,
}

impl ApiState {
    pub fn new(controller: DashboardController) -> Self {
        Self {
            app: controller.state().clone(),
            controller,
        }
    }
}

impl FromRef<ApiState> for Arc<AppState> {
    fn from_ref(state: &ApiState) -> Self {
        state.app.clone()
    }
}

impl FromRef<ApiState> for DashboardController {
    fn from_ref(state: &ApiState) -> Self {
        state.controller.clone()
    }
}
