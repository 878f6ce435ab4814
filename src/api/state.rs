use std::ops::Deref;
use std::sync::Arc;

use derive_new::new;

use crate::overlay::LayoutParams;
use crate::service::Engagement;
use crate::store::VideoStore;

/// Shared handler state: the engagement service plus the overlay defaults
/// the `/overlay` route falls back to.
#[derive(Debug, Clone, new)]
pub struct App {
    pub engagement: Engagement,
    pub overlay: Arc<LayoutParams>,
}

impl Deref for App {
    type Target = Engagement;

    fn deref(&self) -> &Self::Target {
        &self.engagement
    }
}

pub fn create_app(store: Arc<VideoStore>, overlay: LayoutParams) -> App {
    App {
        engagement: Engagement::new(store),
        overlay: Arc::new(overlay),
    }
}
