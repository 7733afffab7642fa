use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

use learnly::{
    domain::{CreateDoubtRequest, CreatePaymentRequest, CreateProfileRequest, UserRole},
    repository::{
        DoubtRepository, PaymentRepository, ProfileRepository, SqliteDoubtRepository,
        SqlitePaymentRepository, SqliteProfileRepository,
    },
    service::PaymentService,
    storage::{LocalDiskBackend, UploadBackend, UploadManager},
};

/// Seed the development database with sample students, payments and doubts.
#[derive(Parser)]
struct Args {
    /// SQLite database to seed
    #[arg(long, default_value = "sqlite:learnly.db")]
    database_url: String,

    /// Number of extra pending students to create
    #[arg(long, default_value_t = 3)]
    pending_students: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Seeding database at {}...", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let profile_repo = Arc::new(SqliteProfileRepository::new(db_pool.clone()));
    let payment_repo = Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
    let doubt_repo = Arc::new(SqliteDoubtRepository::new(db_pool.clone()));

    let uploads = Arc::new(UploadManager::new(vec![Arc::new(LocalDiskBackend::new(
        "uploads",
        "payment-proofs",
        "payment-proof",
    )) as Arc<dyn UploadBackend>]));

    let payment_service = PaymentService::new(
        payment_repo.clone(),
        profile_repo.clone(),
        uploads,
        db_pool.clone(),
    );

    // One fully approved student: payment uploaded and approved, so doubt
    // submission works out of the box.
    let approved = profile_repo
        .upsert(CreateProfileRequest {
            subject: "seed-student-approved".to_string(),
            name: Some("Asha Verma".to_string()),
            email: Some("asha@example.com".to_string()),
            phone: Some("+919876543210".to_string()),
            role: Some(UserRole::Student),
        })
        .await?;

    let payment = payment_repo
        .create(CreatePaymentRequest {
            user_id: approved.id.clone(),
            plan: "monthly".to_string(),
            amount: 499.0,
            payment_method: "UPI".to_string(),
            proof_url: "/uploads/payment-proofs/seed-proof.jpg".to_string(),
        })
        .await?;
    profile_repo
        .set_payment_proof_uploaded(&approved.id, payment.id)
        .await?;
    payment_service.resolve_payment(payment.id, true).await?;

    doubt_repo
        .create(CreateDoubtRequest {
            user_id: approved.id.clone(),
            subject: "Math".to_string(),
            question: "How do I integrate x^2 sin(x)?".to_string(),
            image_url: None,
        })
        .await?;

    println!("  Created approved student {} with one pending doubt", approved.id);

    // One student with a payment still waiting for review.
    let waiting = profile_repo
        .upsert(CreateProfileRequest {
            subject: "seed-student-waiting".to_string(),
            name: Some("Rahul Iyer".to_string()),
            email: Some("rahul@example.com".to_string()),
            phone: Some("+919812345678".to_string()),
            role: Some(UserRole::Student),
        })
        .await?;

    let pending_payment = payment_repo
        .create(CreatePaymentRequest {
            user_id: waiting.id.clone(),
            plan: "quarterly".to_string(),
            amount: 1299.0,
            payment_method: "UPI".to_string(),
            proof_url: "/uploads/payment-proofs/seed-proof-2.jpg".to_string(),
        })
        .await?;
    profile_repo
        .set_payment_proof_uploaded(&waiting.id, pending_payment.id)
        .await?;

    println!("  Created student {} with a pending payment", waiting.id);

    // Fresh signups with no payment yet.
    for n in 0..args.pending_students {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        profile_repo
            .upsert(CreateProfileRequest {
                subject: format!("seed-student-{}", n),
                name: Some(name),
                email: Some(email),
                phone: None,
                role: Some(UserRole::Student),
            })
            .await?;
    }

    println!("  Created {} fresh signups", args.pending_students);
    println!("Done.");

    Ok(())
}
