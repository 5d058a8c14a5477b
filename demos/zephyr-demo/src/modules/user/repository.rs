use super::model::User;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use zephyr::Injectable;

pub trait UserRepository: Send + Sync {
    fn insert(&self, name: String, email: String) -> User;
    fn find(&self, id: u64) -> Option<User>;
    fn all(&self) -> Vec<User>;
    fn save(&self, user: User) -> User;
    fn remove(&self, id: u64) -> bool;
}

#[derive(Injectable)]
pub struct InMemoryUserRepository {
    #[injectable(default)]
    users: DashMap<u64, User>,
    #[injectable(default)]
    next_id: AtomicU64,
}

impl UserRepository for InMemoryUserRepository {
    fn insert(&self, name: String, email: String) -> User {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User { id, name, email };
        self.users.insert(id, user.clone());
        user
    }

    fn find(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    fn save(&self, user: User) -> User {
        self.users.insert(user.id, user.clone());
        user
    }

    fn remove(&self, id: u64) -> bool {
        self.users.remove(&id).is_some()
    }
}
