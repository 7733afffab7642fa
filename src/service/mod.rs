pub mod profile_service;
pub mod payment_service;
pub mod doubt_service;

use std::sync::Arc;
use sqlx::SqlitePool;

use crate::repository::*;
use crate::storage::UploadManager;
pub use doubt_service::DoubtService;
pub use payment_service::PaymentService;
pub use profile_service::ProfileService;

pub struct ServiceContext {
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub doubt_repo: Arc<dyn DoubtRepository>,
    pub profile_service: Arc<ProfileService>,
    pub payment_service: Arc<PaymentService>,
    pub doubt_service: Arc<DoubtService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    /// `proof_uploads` is the prioritized backend chain for payment proofs;
    /// doubt images and profile pictures each get their own chain (local disk
    /// in the shipped configuration).
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        doubt_repo: Arc<dyn DoubtRepository>,
        proof_uploads: Arc<UploadManager>,
        doubt_image_uploads: Arc<UploadManager>,
        picture_uploads: Arc<UploadManager>,
        db_pool: SqlitePool,
    ) -> Self {
        let profile_service = Arc::new(ProfileService::new(
            profile_repo.clone(),
            picture_uploads,
        ));
        let payment_service = Arc::new(PaymentService::new(
            payment_repo.clone(),
            profile_repo.clone(),
            proof_uploads,
            db_pool.clone(),
        ));
        let doubt_service = Arc::new(DoubtService::new(
            doubt_repo.clone(),
            profile_repo.clone(),
            doubt_image_uploads,
        ));

        Self {
            profile_repo,
            payment_repo,
            doubt_repo,
            profile_service,
            payment_service,
            doubt_service,
            db_pool,
        }
    }
}
