//! In-memory store used by unit tests.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    AccountStore, Feedback, IdentityAccount, Interview, InterviewStore, StoreError, User,
    UserStore,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    accounts: DashMap<String, IdentityAccount>,
    interviews: DashMap<String, Interview>,
    feedback: DashMap<String, Feedback>,
    feedback_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove_user(&self, uid: &str) {
        self.users.remove(uid);
    }

    pub fn insert_interview(&self, interview: Interview) {
        self.interviews.insert(interview.id.clone(), interview);
    }

    pub fn insert_feedback(&self, feedback: Feedback) {
        self.feedback.insert(feedback.id.clone(), feedback);
    }

    pub fn feedback_lookups(&self) -> usize {
        self.feedback_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(uid).map(|u| u.clone()))
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account(&self, uid: &str) -> Result<Option<IdentityAccount>, StoreError> {
        Ok(self.accounts.get(uid).map(|a| a.clone()))
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<IdentityAccount>, StoreError> {
        Ok(self
            .accounts
            .iter()
            .find(|a| a.email == email)
            .map(|a| a.clone()))
    }

    async fn insert_account(&self, account: &IdentityAccount) -> Result<(), StoreError> {
        if self.accounts.iter().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }
        self.accounts.insert(account.uid.clone(), account.clone());
        Ok(())
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn get_interview(&self, id: &str) -> Result<Option<Interview>, StoreError> {
        Ok(self.interviews.get(id).map(|i| i.clone()))
    }

    async fn get_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, StoreError> {
        self.feedback_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .feedback
            .iter()
            .find(|f| f.interview_id == interview_id && f.user_id == user_id)
            .map(|f| f.clone()))
    }
}
