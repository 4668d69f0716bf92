use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::HarnessResult;
use crate::fixtures::{delete_post, unfollow};
use crate::models::Session;

/// A resource a scenario created and would like removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupAction {
    DeletePost { session: Session, post_id: String },
    Unfollow { session: Session, user_id: String },
    DeleteProfile { session: Session },
}

impl CleanupAction {
    fn describe(&self) -> String {
        match self {
            CleanupAction::DeletePost { post_id, .. } => format!("delete post {post_id}"),
            CleanupAction::Unfollow { user_id, .. } => format!("unfollow user {user_id}"),
            CleanupAction::DeleteProfile { .. } => "delete profile".to_string(),
        }
    }

    async fn execute(&self, client: &ApiClient) -> HarnessResult<()> {
        let response = match self {
            CleanupAction::DeletePost { session, post_id } => {
                delete_post(client, post_id, session).await?
            }
            CleanupAction::Unfollow { session, user_id } => unfollow(client, user_id, session).await?,
            CleanupAction::DeleteProfile { session } => {
                client.delete(&["users", "profile"], Some(session)).await?
            }
        };
        response.ensure_success(&self.describe())?;
        Ok(())
    }
}

/// Best-effort teardown. Actions run newest first once the scenario body has
/// finished, whatever its outcome; failures are logged and counted, never
/// propagated.
#[derive(Debug, Default)]
pub struct Teardown {
    actions: Vec<CleanupAction>,
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: CleanupAction) {
        self.actions.push(action);
    }

    /// Drops an action whose effect the scenario already undid itself.
    pub fn resolve(&mut self, action: &CleanupAction) {
        if let Some(index) = self.actions.iter().rposition(|pending| pending == action) {
            self.actions.remove(index);
        }
    }

    pub fn pending(&self) -> &[CleanupAction] {
        &self.actions
    }

    /// Runs every registered action and returns how many failed.
    pub async fn run(&mut self, client: &ApiClient, scenario: &str) -> usize {
        let mut failures = 0;
        while let Some(action) = self.actions.pop() {
            match action.execute(client).await {
                Ok(()) => debug!(scenario, action = %action.describe(), "cleanup succeeded"),
                Err(err) => {
                    failures += 1;
                    warn!(scenario, action = %action.describe(), error = %err, "cleanup failed");
                }
            }
        }
        failures
    }
}
