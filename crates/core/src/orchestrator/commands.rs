//! Commands routed through the orchestrator's actor.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::actor::Message;

use super::types::{OrchestratorError, TaskStatusReport};

/// One-shot reply slot carried by every command.
pub type Reply<T> = oneshot::Sender<Result<T, OrchestratorError>>;

/// A registry command. Each carries its payload, a reply slot and the
/// caller's cancellation token (cancelled once the caller stops waiting).
pub enum TaskCommand {
    Create {
        urls: Vec<String>,
        reply: Reply<String>,
        cancel: CancellationToken,
    },
    AddUrls {
        task_id: String,
        urls: Vec<String>,
        reply: Reply<TaskStatusReport>,
        cancel: CancellationToken,
    },
    Status {
        task_id: String,
        reply: Reply<TaskStatusReport>,
        cancel: CancellationToken,
    },
}

/// Dispatch tag for [`TaskCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    Create,
    AddUrls,
    Status,
}

impl TaskAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskAction::Create => "create",
            TaskAction::AddUrls => "add_urls",
            TaskAction::Status => "status",
        }
    }
}

impl Message for TaskCommand {
    type Action = TaskAction;

    fn action(&self) -> TaskAction {
        match self {
            TaskCommand::Create { .. } => TaskAction::Create,
            TaskCommand::AddUrls { .. } => TaskAction::AddUrls,
            TaskCommand::Status { .. } => TaskAction::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_action_tags() {
        let (reply, _rx) = oneshot::channel();
        let command = TaskCommand::Create {
            urls: vec![],
            reply,
            cancel: CancellationToken::new(),
        };
        assert_eq!(command.action(), TaskAction::Create);

        let (reply, _rx) = oneshot::channel();
        let command = TaskCommand::Status {
            task_id: "t".to_string(),
            reply,
            cancel: CancellationToken::new(),
        };
        assert_eq!(command.action(), TaskAction::Status);
        assert_eq!(TaskAction::AddUrls.as_str(), "add_urls");
    }
}
