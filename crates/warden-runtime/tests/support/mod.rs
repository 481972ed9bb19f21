//! Scripted collaborators for engine tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use warden_core::{GroupId, MessageRef, PlatformEffects, PlatformError, SubjectId, Timestamp};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    Restrict {
        group: GroupId,
        subject: SubjectId,
        until: Timestamp,
    },
    Unrestrict {
        group: GroupId,
        subject: SubjectId,
    },
    BanMember {
        group: GroupId,
        subject: SubjectId,
    },
    UnbanMember {
        group: GroupId,
        subject: SubjectId,
    },
    DeleteMessage {
        group: GroupId,
        message: MessageRef,
    },
    SendMessage {
        group: GroupId,
        text: String,
        message: MessageRef,
    },
    PinMessage {
        group: GroupId,
        message: MessageRef,
    },
    UnpinMessage {
        group: GroupId,
        message: MessageRef,
    },
}

/// Platform gateway that records every call and can be told to fail
/// restrictions for chosen subjects.
pub struct MockPlatform {
    calls: Mutex<Vec<PlatformCall>>,
    fail_restrict: Mutex<HashSet<SubjectId>>,
    next_message: AtomicI64,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_restrict: Mutex::new(HashSet::new()),
            next_message: AtomicI64::new(1000),
        }
    }

    /// Make future `restrict` calls for this subject fail, as if they
    /// already left the group.
    pub fn fail_restrict_for(&self, subject: SubjectId) {
        self.fail_restrict.lock().insert(subject);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    pub fn restricted_subjects(&self) -> Vec<SubjectId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Restrict { subject, .. } => Some(*subject),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_messages(&self) -> Vec<MessageRef> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::DeleteMessage { message, .. } => Some(*message),
                _ => None,
            })
            .collect()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::SendMessage { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pinned_messages(&self) -> Vec<MessageRef> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::PinMessage { message, .. } => Some(*message),
                _ => None,
            })
            .collect()
    }

    pub fn unpinned_messages(&self) -> Vec<MessageRef> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                PlatformCall::UnpinMessage { message, .. } => Some(*message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().push(call);
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformEffects for MockPlatform {
    async fn restrict(
        &self,
        group: GroupId,
        subject: SubjectId,
        until: Timestamp,
    ) -> Result<(), PlatformError> {
        if self.fail_restrict.lock().contains(&subject) {
            return Err(PlatformError::SubjectMissing { group, subject });
        }
        self.record(PlatformCall::Restrict {
            group,
            subject,
            until,
        });
        Ok(())
    }

    async fn unrestrict(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError> {
        self.record(PlatformCall::Unrestrict { group, subject });
        Ok(())
    }

    async fn ban_member(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError> {
        self.record(PlatformCall::BanMember { group, subject });
        Ok(())
    }

    async fn unban_member(&self, group: GroupId, subject: SubjectId) -> Result<(), PlatformError> {
        self.record(PlatformCall::UnbanMember { group, subject });
        Ok(())
    }

    async fn delete_message(
        &self,
        group: GroupId,
        message: MessageRef,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::DeleteMessage { group, message });
        Ok(())
    }

    async fn send_message(&self, group: GroupId, text: &str) -> Result<MessageRef, PlatformError> {
        let message = MessageRef::new(self.next_message.fetch_add(1, Ordering::SeqCst));
        self.record(PlatformCall::SendMessage {
            group,
            text: text.to_string(),
            message,
        });
        Ok(message)
    }

    async fn pin_message(&self, group: GroupId, message: MessageRef) -> Result<(), PlatformError> {
        self.record(PlatformCall::PinMessage { group, message });
        Ok(())
    }

    async fn unpin_message(
        &self,
        group: GroupId,
        message: MessageRef,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::UnpinMessage { group, message });
        Ok(())
    }

    async fn is_admin(&self, _group: GroupId, _subject: SubjectId) -> Result<bool, PlatformError> {
        Ok(true)
    }
}
