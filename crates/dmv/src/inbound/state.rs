use std::sync::Arc;

use crate::usecase::facebook::FacebookUseCase;

#[derive(Clone)]
pub struct FacebookState {
    pub facebook: Arc<dyn FacebookUseCase>,
}

impl FacebookState {
    pub fn new(facebook: Arc<dyn FacebookUseCase>) -> Self {
        Self { facebook }
    }
}
