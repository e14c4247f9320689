//! Local copy of the user's notifications.
//!
//! Reads are reconciled with the server explicitly; dismissing only hides a
//! notification on this client.

use crate::{
    api::{ApiClient, notifications, types::Notification},
    errors::AppError,
};
use tracing::{debug, instrument};

pub struct NotificationCenter {
    client: ApiClient,
    items: Vec<Notification>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            items: Vec::new(),
        }
    }

    /// Replaces the local copy with the server's list.
    ///
    /// # Errors
    /// Returns network, HTTP or parse errors; the local copy is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&[Notification], AppError> {
        self.items = notifications::fetch(&self.client).await?;
        debug!(count = self.items.len(), "notifications loaded");
        Ok(&self.items)
    }

    #[must_use]
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.read).count()
    }

    /// Marks one notification read here and on the server. The local flag is
    /// restored if the server call fails.
    ///
    /// # Errors
    /// Returns the API error.
    pub async fn mark_read(&mut self, id: &str) -> Result<(), AppError> {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return notifications::mark_read(&self.client, id).await;
        };
        if self.items[index].read {
            return Ok(());
        }

        self.items[index].read = true;
        if let Err(err) = notifications::mark_read(&self.client, id).await {
            self.items[index].read = false;
            return Err(err);
        }
        Ok(())
    }

    /// Hides a notification on this client only.
    pub fn dismiss(&mut self, id: &str) -> Option<Notification> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    /// # Errors
    /// Returns the API error; nothing changes locally in that case.
    pub async fn mark_all_read(&mut self) -> Result<(), AppError> {
        notifications::mark_all_read(&self.client).await?;
        for item in &mut self.items {
            item.read = true;
        }
        Ok(())
    }
}
