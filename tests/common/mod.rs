#![allow(dead_code)]

use std::io::Write;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use noticeboard::{
    domain::*,
    error::{AppError, Result},
    repository::{
        DepartmentRepository, NewProfile, NoticeRepository, ProfileRepository, RoleRepository,
        SqliteProfileRepository,
    },
    storage::{Bucket, ObjectStorage, UploadedFile},
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// A single-connection in-memory database with the schema applied.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Collects formatted log output for the current thread while the guard lives.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub async fn insert_profile(pool: &SqlitePool, email: &str) -> anyhow::Result<Profile> {
    let repo = SqliteProfileRepository::new(pool.clone());
    Ok(repo
        .create(NewProfile {
            email: email.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await?)
}

pub fn notice(author_id: Uuid, title: &str, status: NoticeStatus, created_at: DateTime<Utc>) -> Notice {
    Notice {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("<p>{}</p>", title),
        category: NoticeCategory::General,
        priority: NoticePriority::Normal,
        status,
        author_id,
        banner_url: None,
        attachments: Vec::new(),
        target_audience: default_audience(),
        publish_at: None,
        expire_at: None,
        archived: false,
        views: 0,
        view_count: 0,
        created_at,
        updated_at: created_at,
    }
}

pub fn file(name: &str, content_type: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content_type: content_type.to_string(),
        data: b"fake file contents".to_vec(),
    }
}

/// In-memory object store that fails for chosen file names.
#[derive(Default)]
pub struct FakeStorage {
    pub failing: Vec<String>,
    pub uploads: Mutex<Vec<(Bucket, String, String)>>,
}

impl FakeStorage {
    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, bucket: Bucket, key: &str, file: &UploadedFile) -> Result<()> {
        if self.failing.contains(&file.file_name) {
            return Err(AppError::Storage(format!("simulated failure for {}", file.file_name)));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bucket, key.to_string(), file.file_name.clone()));
        Ok(())
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("https://files.test/{}/{}", bucket.name(), key)
    }
}

/// Notice store that records every call and can be told to fail inserts.
#[derive(Default)]
pub struct RecordingNoticeRepository {
    pub created: Mutex<Vec<Notice>>,
    pub calls: AtomicUsize,
    pub fail_inserts: bool,
}

impl RecordingNoticeRepository {
    pub fn failing() -> Self {
        Self { fail_inserts: true, ..Default::default() }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<Notice> {
        self.created.lock().unwrap().clone()
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NoticeRepository for RecordingNoticeRepository {
    async fn create(&self, notice: Notice) -> Result<Notice> {
        self.touch();
        if self.fail_inserts {
            return Err(AppError::Database("insert rejected".to_string()));
        }
        self.created.lock().unwrap().push(notice.clone());
        Ok(notice)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Notice>> {
        self.touch();
        Ok(self.created.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn list_approved(&self, _query: &NoticeQuery, _limit: Option<i64>) -> Result<Vec<Notice>> {
        self.touch();
        Ok(Vec::new())
    }

    async fn list_by_author(&self, _author_id: Uuid) -> Result<Vec<Notice>> {
        self.touch();
        Ok(Vec::new())
    }

    async fn list_by_status(&self, _status: NoticeStatus) -> Result<Vec<Notice>> {
        self.touch();
        Ok(Vec::new())
    }

    async fn list_expirable(&self, _now: DateTime<Utc>) -> Result<Vec<Notice>> {
        self.touch();
        Ok(Vec::new())
    }

    async fn update_status(&self, _id: Uuid, _status: NoticeStatus) -> Result<Notice> {
        self.touch();
        Err(AppError::NotFound("Notice not found".to_string()))
    }

    async fn increment_views(&self, _id: Uuid) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn delete(&self, _id: Uuid) -> Result<()> {
        self.touch();
        Ok(())
    }

    async fn stats(&self, _author_id: Option<Uuid>) -> Result<NoticeStats> {
        self.touch();
        Ok(NoticeStats::default())
    }
}

/// Role store whose lookups always fail.
pub struct FailingRoleRepository;

#[async_trait]
impl RoleRepository for FailingRoleRepository {
    async fn find_role(&self, _user_id: Uuid) -> Result<Option<AppRole>> {
        Err(AppError::Database("connection reset".to_string()))
    }

    async fn assign(&self, _user_id: Uuid, _role: AppRole, _assigned_by: Option<Uuid>) -> Result<RoleAssignment> {
        Err(AppError::Database("connection reset".to_string()))
    }

    async fn list_all(&self) -> Result<Vec<RoleAssignment>> {
        Err(AppError::Database("connection reset".to_string()))
    }

    async fn count_distinct_roles(&self) -> Result<i64> {
        Err(AppError::Database("connection reset".to_string()))
    }
}

/// Role store backed by a fixed answer.
pub struct FixedRoleRepository(pub Option<AppRole>);

#[async_trait]
impl RoleRepository for FixedRoleRepository {
    async fn find_role(&self, _user_id: Uuid) -> Result<Option<AppRole>> {
        Ok(self.0)
    }

    async fn assign(&self, user_id: Uuid, role: AppRole, assigned_by: Option<Uuid>) -> Result<RoleAssignment> {
        Ok(RoleAssignment {
            id: Uuid::new_v4(),
            user_id,
            role,
            assigned_by,
            assigned_at: Utc::now(),
        })
    }

    async fn list_all(&self) -> Result<Vec<RoleAssignment>> {
        Ok(Vec::new())
    }

    async fn count_distinct_roles(&self) -> Result<i64> {
        Ok(self.0.map(|_| 1).unwrap_or(0))
    }
}

/// Department store that only counts how often delete is reached.
#[derive(Default)]
pub struct CountingDepartmentRepository {
    pub deletes: AtomicUsize,
}

impl CountingDepartmentRepository {
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DepartmentRepository for CountingDepartmentRepository {
    async fn create(&self, request: CreateDepartmentRequest) -> Result<Department> {
        Ok(Department {
            id: Uuid::new_v4(),
            name: request.name,
            code: request.code,
            faculty: request.faculty,
            created_at: Utc::now(),
        })
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Department>> {
        Ok(None)
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<Department>> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<Department>> {
        Ok(Vec::new())
    }

    async fn update(&self, _id: Uuid, _update: UpdateDepartmentRequest) -> Result<Department> {
        Err(AppError::NotFound("Department not found".to_string()))
    }

    async fn delete(&self, _id: Uuid) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
