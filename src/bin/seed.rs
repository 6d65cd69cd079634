use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use fake::{
    faker::{
        lorem::en::{Paragraphs, Sentence},
        name::en::Name,
    },
    Fake,
};
use noticeboard::{
    auth::AuthService,
    domain::{
        AppRole, CreateDepartmentRequest, Notice, NoticeCategory, NoticePriority, NoticeStatus,
        Profile, SignUpRequest, UpdateProfileRequest,
    },
    error::AppError,
    repository::{
        DepartmentRepository, NoticeRepository, ProfileRepository, RoleRepository,
        SqliteDepartmentRepository, SqliteNoticeRepository, SqliteProfileRepository,
        SqliteRoleRepository,
    },
};
use rand::{seq::SliceRandom, Rng};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

/// Fill a development database with accounts, departments and notices.
#[derive(Parser, Debug)]
#[command(name = "seed")]
struct Args {
    #[arg(long, default_value = "sqlite://noticeboard.db?mode=rwc")]
    database_url: String,

    /// How many notices to generate.
    #[arg(long, default_value_t = 24)]
    notices: usize,
}

const DEPARTMENTS: &[(&str, &str, &str)] = &[
    ("Computer Science", "CS", "Science & Technology"),
    ("Mathematics", "MATH", "Science & Technology"),
    ("Economics", "ECON", "Social Sciences"),
    ("English Literature", "ENG", "Arts & Humanities"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    println!("🌱 Seeding {}", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let profiles: Arc<dyn ProfileRepository> = Arc::new(SqliteProfileRepository::new(db_pool.clone()));
    let roles: Arc<dyn RoleRepository> = Arc::new(SqliteRoleRepository::new(db_pool.clone()));
    let departments = SqliteDepartmentRepository::new(db_pool.clone());
    let notices = SqliteNoticeRepository::new(db_pool.clone());
    let auth = AuthService::new(db_pool.clone(), profiles.clone(), roles.clone(), 24);

    println!("👥 Creating accounts...");
    let admin = ensure_account(&auth, profiles.as_ref(), roles.as_ref(), "admin@university.local", "Notice Admin", AppRole::Admin).await?;
    let dean = ensure_account(&auth, profiles.as_ref(), roles.as_ref(), "dean@university.local", "Faculty Dean", AppRole::Dean).await?;
    let staff = ensure_account(&auth, profiles.as_ref(), roles.as_ref(), "staff@university.local", "Office Staff", AppRole::Staff).await?;
    ensure_account(&auth, profiles.as_ref(), roles.as_ref(), "student@university.local", "Sample Student", AppRole::Student).await?;

    for i in 0..5 {
        let name: String = Name().fake();
        let email = format!("student{}@university.local", i + 1);
        ensure_account(&auth, profiles.as_ref(), roles.as_ref(), &email, &name, AppRole::Student).await?;
    }
    println!("  ✅ Accounts ready (password for all: password123)");

    println!("🏛  Creating departments...");
    for (name, code, faculty) in DEPARTMENTS {
        if departments.find_by_name(name).await?.is_some() {
            continue;
        }
        departments
            .create(CreateDepartmentRequest {
                name: name.to_string(),
                code: Some(code.to_string()),
                faculty: Some(faculty.to_string()),
            })
            .await?;
    }

    profiles
        .update(staff.id, UpdateProfileRequest {
            department: Some(DEPARTMENTS[0].0.to_string()),
            faculty: Some(DEPARTMENTS[0].2.to_string()),
            ..Default::default()
        })
        .await?;

    println!("📰 Creating {} notices...", args.notices);
    let authors = [admin.id, dean.id, staff.id];
    let mut rng = rand::thread_rng();
    for i in 0..args.notices {
        let status = match i % 6 {
            0 => NoticeStatus::Draft,
            1 => NoticeStatus::Pending,
            2 => NoticeStatus::Rejected,
            _ => NoticeStatus::Approved,
        };
        let created_at = Utc::now() - Duration::hours(rng.gen_range(1..24 * 60));
        let paragraphs: Vec<String> = Paragraphs(2..4).fake();
        let content = paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", p))
            .collect::<String>();
        let priority = *[NoticePriority::Urgent, NoticePriority::Normal, NoticePriority::Normal, NoticePriority::Low]
            .choose(&mut rng)
            .unwrap_or(&NoticePriority::Normal);
        let category = *NoticeCategory::ALL
            .choose(&mut rng)
            .unwrap_or(&NoticeCategory::General);
        let author_id = *authors.choose(&mut rng).unwrap_or(&admin.id);
        let views = if status == NoticeStatus::Approved { rng.gen_range(0..500) } else { 0 };

        notices
            .create(Notice {
                id: Uuid::new_v4(),
                title: Sentence(3..8).fake::<String>().trim_end_matches('.').to_string(),
                content,
                category,
                priority,
                status,
                author_id,
                banner_url: None,
                attachments: Vec::new(),
                target_audience: vec!["all".to_string()],
                publish_at: Some(created_at),
                expire_at: Some(created_at + Duration::days(rng.gen_range(30..120))),
                archived: false,
                views,
                view_count: views,
                created_at,
                updated_at: created_at,
            })
            .await?;
    }

    println!("✨ Seeding complete");
    println!("   admin@university.local / password123");
    Ok(())
}

async fn ensure_account(
    auth: &AuthService,
    profiles: &dyn ProfileRepository,
    roles: &dyn RoleRepository,
    email: &str,
    full_name: &str,
    role: AppRole,
) -> anyhow::Result<Profile> {
    let profile = match auth
        .sign_up(SignUpRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            full_name: full_name.to_string(),
        })
        .await
    {
        Ok(profile) => profile,
        Err(AppError::Conflict(_)) => profiles
            .find_by_email(email)
            .await?
            .ok_or_else(|| anyhow::anyhow!("{} vanished during seeding", email))?,
        Err(e) => return Err(e.into()),
    };

    roles.assign(profile.id, role, None).await?;
    Ok(profile)
}
