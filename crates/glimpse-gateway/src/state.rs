use std::sync::Arc;

use glimpse_viewer::Viewer;

#[derive(Clone)]
pub struct AppState {
    viewer: Arc<dyn Viewer>,
}

impl AppState {
    pub fn new(viewer: Arc<dyn Viewer>) -> Self {
        Self { viewer }
    }

    pub fn viewer(&self) -> &dyn Viewer {
        self.viewer.as_ref()
    }
}
