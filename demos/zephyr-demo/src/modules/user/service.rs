use super::model::{CreateUser, UpdateUser, User};
use super::repository::UserRepository;
use std::sync::Arc;
use zephyr::Injectable;

#[derive(Injectable)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn create(&self, request: CreateUser) -> User {
        let user = self.repository.insert(request.name, request.email);
        tracing::info!(id = user.id, "User created");
        user
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.repository.find(id)
    }

    /// Every user, optionally only those whose name contains `filter`
    pub fn list(&self, filter: Option<&str>) -> Vec<User> {
        let users = self.repository.all();
        match filter {
            Some(filter) => users.into_iter().filter(|user| user.name.contains(filter)).collect(),
            None => users,
        }
    }

    pub fn update(&self, id: u64, changes: UpdateUser) -> Option<User> {
        let mut user = self.repository.find(id)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        Some(self.repository.save(user))
    }

    pub fn delete(&self, id: u64) -> bool {
        self.repository.remove(id)
    }
}
