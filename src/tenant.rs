use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use crate::dispatcher::{spawn_dispatcher, Outbox};
use crate::engine::Engine;
use crate::limits::*;
use crate::notify::NotifyHub;
use crate::reminders;
use crate::snapshot::Snapshot;

/// A loaded studio: its engine and the outbox its dispatcher fills.
#[derive(Clone)]
pub struct Studio {
    pub engine: Arc<Engine>,
    pub outbox: Outbox,
}

/// Manages per-tenant studios. Each tenant gets its own Engine + state document +
/// dispatcher + reminder task.
pub struct TenantManager {
    studios: DashMap<String, Studio>,
    data_dir: PathBuf,
    reminder_period: Duration,
}

impl TenantManager {
    pub fn new(data_dir: PathBuf, reminder_period: Duration) -> Self {
        Self {
            studios: DashMap::new(),
            data_dir,
            reminder_period,
        }
    }

    /// Get or lazily load the studio for the given tenant.
    ///
    /// Studios are keyed by their directory name, so names that sanitize to the same
    /// directory share one engine.
    pub fn get_or_create(&self, tenant: &str) -> std::io::Result<Studio> {
        if tenant.len() > MAX_TENANT_NAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "tenant name too long",
            ));
        }

        // Only alphanumerics, `_` and `-` reach the filesystem
        let safe_name: String = tenant
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe_name.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty tenant name",
            ));
        }

        if let Some(studio) = self.studios.get(&safe_name) {
            return Ok(studio.value().clone());
        }
        // `len` locks every shard, so it must run before `entry` takes one.
        if self.studios.len() >= MAX_TENANTS {
            return Err(std::io::Error::other("too many tenants"));
        }

        let studio = match self.studios.entry(safe_name) {
            Entry::Occupied(existing) => return Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let dir = self.data_dir.join(slot.key());
                std::fs::create_dir_all(&dir)?;
                let (dispatcher, outbox) = spawn_dispatcher();
                let notify = Arc::new(NotifyHub::new());
                let engine = Arc::new(Engine::new(Snapshot::in_dir(&dir), notify, dispatcher));

                let reminder_engine = engine.clone();
                let period = self.reminder_period;
                tokio::spawn(async move {
                    reminders::run_reminders(reminder_engine, period).await;
                });

                info!("loaded tenant {tenant} from {}", dir.display());
                slot.insert(Studio { engine, outbox }).value().clone()
            }
        };
        metrics::gauge!(crate::observability::TENANTS_ACTIVE).set(self.studios.len() as f64);
        Ok(studio)
    }

    pub fn tenants(&self) -> Vec<String> {
        let mut names: Vec<String> = self.studios.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::fs;

    const HOUR: Duration = Duration::from_secs(3600);

    fn test_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("pilatesdesk_test_tenant").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fields(student: &str) -> BookingFields {
        BookingFields::new(Slot::new(1, "08:00"), student, "Ana")
    }

    #[tokio::test]
    async fn studios_do_not_share_bookings() {
        let dir = test_data_dir("isolated");
        let tm = TenantManager::new(dir, HOUR);

        let a = tm.get_or_create("studio_a").unwrap();
        let b = tm.get_or_create("studio_b").unwrap();

        a.engine.create_booking(fields("Maria")).await.unwrap();

        assert_eq!(a.engine.bookings().await.len(), 1);
        assert!(b.engine.bookings().await.is_empty());
    }

    #[tokio::test]
    async fn studio_dir_created_on_first_use() {
        let dir = test_data_dir("first_use");
        let tm = TenantManager::new(dir.clone(), HOUR);

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert!(entries.is_empty());

        let studio = tm.get_or_create("my_studio").unwrap();
        assert!(dir.join("my_studio").is_dir());

        studio.engine.create_booking(fields("Maria")).await.unwrap();
        studio.engine.flush().await.unwrap();
        assert!(dir.join("my_studio").join("pilatesdesk-state.json").exists());
    }

    #[tokio::test]
    async fn same_name_returns_same_studio() {
        let dir = test_data_dir("same_studio");
        let tm = TenantManager::new(dir, HOUR);

        let s1 = tm.get_or_create("foo").unwrap();
        let s2 = tm.get_or_create("foo").unwrap();

        assert!(Arc::ptr_eq(&s1.engine, &s2.engine));
        assert_eq!(tm.tenants(), vec!["foo".to_string()]);
    }

    #[tokio::test]
    async fn names_with_same_directory_share_one_studio() {
        let dir = test_data_dir("same_dir");
        let tm = TenantManager::new(dir.clone(), HOUR);

        let a = tm.get_or_create("core").unwrap();
        let b = tm.get_or_create("co/re").unwrap();
        let c = tm.get_or_create("../core").unwrap();
        assert!(Arc::ptr_eq(&a.engine, &b.engine));
        assert!(Arc::ptr_eq(&a.engine, &c.engine));
        assert_eq!(tm.tenants(), vec!["core".to_string()]);

        a.engine.create_booking(fields("Maria")).await.unwrap();
        a.engine.flush().await.unwrap();
        b.engine.create_booking(fields("Joana")).await.unwrap();
        b.engine.flush().await.unwrap();

        let stored = Snapshot::in_dir(&dir.join("core")).try_load().unwrap().unwrap();
        let mut students: Vec<String> = stored.bookings.into_iter().map(|b| b.student).collect();
        students.sort();
        assert_eq!(students, vec!["Joana".to_string(), "Maria".to_string()]);
    }

    #[tokio::test]
    async fn reopened_studio_sees_saved_bookings() {
        let dir = test_data_dir("reload");
        {
            let tm = TenantManager::new(dir.clone(), HOUR);
            let studio = tm.get_or_create("core").unwrap();
            studio.engine.create_booking(fields("Maria")).await.unwrap();
            studio.engine.flush().await.unwrap();
        }
        let tm = TenantManager::new(dir, HOUR);
        let studio = tm.get_or_create("core").unwrap();
        let bookings = studio.engine.bookings().await;
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].student, "Maria");
    }

    #[tokio::test]
    async fn studio_name_stripped_of_path_chars() {
        let dir = test_data_dir("path_chars");
        let tm = TenantManager::new(dir.clone(), HOUR);

        // Path traversal attempt
        let _studio = tm.get_or_create("../evil").unwrap();
        assert!(dir.join("evil").is_dir());

        // Nothing left after stripping
        let result = tm.get_or_create("../..");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn overlong_studio_name_rejected() {
        let dir = test_data_dir("overlong");
        let tm = TenantManager::new(dir, HOUR);

        let long_name = "x".repeat(MAX_TENANT_NAME_LEN + 1);
        let err = tm.get_or_create(&long_name).err().unwrap();
        assert!(err.to_string().contains("tenant name too long"));
    }

    #[tokio::test]
    async fn studio_count_capped() {
        let dir = test_data_dir("count_cap");
        let tm = TenantManager::new(dir, HOUR);

        for i in 0..MAX_TENANTS {
            tm.get_or_create(&format!("t{i}")).unwrap();
        }
        let err = tm.get_or_create("one_more").err().unwrap();
        assert!(err.to_string().contains("too many tenants"));
    }
}
