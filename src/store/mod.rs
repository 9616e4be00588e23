use anyhow::Result;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde_json;
use tokio::sync::Mutex;

use crate::model::{robot::Robot, user::User};

use std::str;

/// Result of the store-side create path. Uniqueness is decided here, under
/// the write lock, not by the handlers' advisory pre-checks.
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    UsernameTaken,
    EmailTaken,
}

pub struct Store {
    db: DB,
    // Serializes create_user so the check-then-write of the uniqueness
    // indexes cannot interleave between two registrations.
    create_lock: Mutex<()>,
}

impl Store {
    pub fn new(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self {
            db,
            create_lock: Mutex::new(()),
        })
    }

    // ============================================================
    // KEYS
    // ============================================================
    fn user_key(id: &str) -> String {
        format!("user:{id}")
    }

    fn username_key(username: &str) -> String {
        format!("user_name:{username}")
    }

    fn email_key(email: &str) -> String {
        format!("user_email:{email}")
    }

    fn robot_key(id: &str) -> String {
        format!("robot:{id}")
    }

    fn fleet_prefix(user_id: &str) -> String {
        format!("fleet:{user_id}:")
    }

    fn fleet_key(user_id: &str, robot_id: &str) -> String {
        format!("{}{}", Self::fleet_prefix(user_id), robot_id)
    }

    // ============================================================
    // USER STORAGE
    // ============================================================

    /// Create a user together with its username/email lookup indexes in one
    /// write batch. Rejects a duplicate username or email even when the
    /// caller raced another registration past the advisory checks.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<CreateUserOutcome> {
        let _guard = self.create_lock.lock().await;

        if self.db.get(Self::username_key(username))?.is_some() {
            return Ok(CreateUserOutcome::UsernameTaken);
        }
        if self.db.get(Self::email_key(email))?.is_some() {
            return Ok(CreateUserOutcome::EmailTaken);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_ts: chrono::Utc::now().timestamp(),
        };

        let mut batch = WriteBatch::default();
        batch.put(Self::user_key(&user.id), serde_json::to_vec(&user)?);
        batch.put(Self::username_key(username), user.id.as_bytes());
        batch.put(Self::email_key(email), user.id.as_bytes());
        self.db.write(batch)?;

        Ok(CreateUserOutcome::Created(user))
    }

    pub async fn load_user(&self, id: &str) -> Result<Option<User>> {
        let key = Self::user_key(id);
        match self.db.get(key)? {
            Some(val) => Ok(Some(serde_json::from_slice(&val)?)),
            None => Ok(None),
        }
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.db.get(Self::username_key(username))? {
            Some(id) => self.load_user(str::from_utf8(&id)?).await,
            None => Ok(None),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.db.get(Self::email_key(email))? {
            Some(id) => self.load_user(str::from_utf8(&id)?).await,
            None => Ok(None),
        }
    }

    // ============================================================
    // ROBOT STORAGE
    // ============================================================
    pub async fn save_robot(&self, robot: &Robot) -> Result<()> {
        let key = Self::robot_key(&robot.id);
        let val = serde_json::to_vec(robot)?;
        self.db.put(key, val)?;
        Ok(())
    }

    pub async fn load_robot(&self, id: &str) -> Result<Option<Robot>> {
        let key = Self::robot_key(id);
        match self.db.get(key)? {
            Some(val) => Ok(Some(serde_json::from_slice(&val)?)),
            None => Ok(None),
        }
    }

    pub async fn list_robots(&self) -> Result<Vec<Robot>> {
        let prefix = "robot:";
        let mut results = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;

            if !k.starts_with(prefix) {
                break;
            }

            let robot: Robot = serde_json::from_slice(&val)?;
            results.push(robot);
        }

        Ok(results)
    }

    // ============================================================
    // FLEET ASSOCIATION (user <-> robot)
    // ============================================================
    /// Default fleet provisioning: attach every robot that exists right now
    /// to the given user, in one batch. Robots created later are not
    /// retroactively attached. Returns how many were attached.
    pub async fn attach_all_robots(&self, user_id: &str) -> Result<usize> {
        let robots = self.list_robots().await?;

        let mut batch = WriteBatch::default();
        for robot in &robots {
            batch.put(Self::fleet_key(user_id, &robot.id), robot.id.as_bytes());
        }
        self.db.write(batch)?;

        Ok(robots.len())
    }

    pub async fn robots_for_user(&self, user_id: &str) -> Result<Vec<Robot>> {
        let prefix = Self::fleet_prefix(user_id);
        let mut robot_ids = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, _) = item?;
            let k = str::from_utf8(&key)?;
            if !k.starts_with(&prefix) {
                break;
            }
            robot_ids.push(k[prefix.len()..].to_string());
        }

        let mut robots = Vec::with_capacity(robot_ids.len());
        for robot_id in robot_ids {
            if let Some(robot) = self.load_robot(&robot_id).await? {
                robots.push(robot);
            }
        }

        Ok(robots)
    }

    /// Seed a small demo fleet into an empty store. No-op once any robot
    /// exists. Returns how many robots were written.
    pub async fn seed_demo_fleet(&self) -> Result<usize> {
        if !self.list_robots().await?.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp();
        let demo = [
            ("JoJo", true, 80u8),
            ("Rover One", true, 60),
            ("Scout", false, 40),
        ];

        for (name, online, battery) in demo {
            let robot = Robot {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                online,
                battery,
                created_ts: now,
            };
            self.save_robot(&robot).await?;
        }

        Ok(demo.len())
    }
}
