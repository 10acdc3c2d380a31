use crate::review::ImageReviewer;

pub(crate) struct ApiServerState {
    pub(crate) reviewer: ImageReviewer,
}
