use crate::Result;
use async_trait::async_trait;
use glimpse_core::Code;
use serde_json::Value;

/// What a reader gets back for one code.
///
/// `NotFound` and `Exhausted` stay distinct so clients can tell a code that
/// never existed from one that has been used up.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    NotFound,
    Exhausted,
    Consumed {
        code: Code,
        payload: Value,
        remaining_views: u32,
    },
}

impl View {
    pub fn found(&self) -> bool {
        !matches!(self, View::NotFound)
    }

    pub fn exhausted(&self) -> bool {
        matches!(self, View::Exhausted)
    }
}

#[async_trait]
pub trait Viewer: Send + Sync + 'static {
    /// Consumes one view of `code` if one is left.
    async fn view(&self, code: &Code) -> Result<View>;
}
