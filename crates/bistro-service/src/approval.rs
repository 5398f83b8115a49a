//! # Approval Gate
//!
//! Manager-PIN authorization for voids, refunds and large discounts.
//!
//! An [`Approval`] can only be produced inside this crate, by a verified PIN
//! or by a manager acting in person.

use std::sync::Arc;

use tracing::{info, warn};

use crate::collaborators::PinVerifier;
use crate::context::Actor;
use crate::error::{ApiError, ApiResult};

/// Proof that a manager approved an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    approver_id: String,
    approver_name: String,
}

impl Approval {
    /// The actor approves their own action. Callers decide when that is allowed.
    pub(crate) fn by_actor(actor: &Actor) -> Self {
        Approval {
            approver_id: actor.user_id.clone(),
            approver_name: actor.name.clone(),
        }
    }

    pub fn approver_id(&self) -> &str {
        &self.approver_id
    }

    pub fn approver_name(&self) -> &str {
        &self.approver_name
    }
}

/// Verifies manager PINs through a [`PinVerifier`].
#[derive(Clone)]
pub struct ApprovalGate {
    verifier: Arc<dyn PinVerifier>,
}

impl ApprovalGate {
    pub fn new(verifier: Arc<dyn PinVerifier>) -> Self {
        ApprovalGate { verifier }
    }

    /// Verifies `pin` for `action`.
    ///
    /// A missing PIN, a rejected PIN, or a success without an approver id all
    /// return `UNAUTHORIZED`. An unreachable verifier is `OPERATION_FAILED`.
    pub async fn authorize(
        &self,
        actor: &Actor,
        pin: Option<&str>,
        action: &str,
    ) -> ApiResult<Approval> {
        let pin = match pin.map(str::trim) {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(ApiError::unauthorized(format!(
                    "Manager approval is required to {action}"
                )))
            }
        };

        let verification = self.verifier.verify_pin(pin).await?;
        match (verification.success, verification.approver_id) {
            (true, Some(approver_id)) => {
                info!(
                    actor = %actor.user_id,
                    approver = %approver_id,
                    action,
                    "Manager approval granted"
                );
                Ok(Approval {
                    approver_name: verification.approver_name.unwrap_or_default(),
                    approver_id,
                })
            }
            _ => {
                warn!(actor = %actor.user_id, action, "Manager PIN rejected");
                Err(ApiError::unauthorized(format!(
                    "Invalid manager PIN; cannot {action}"
                )))
            }
        }
    }

    /// Approval on behalf of a manager acting directly.
    ///
    /// Only usable when the actor already holds a manager role.
    pub fn self_approve(&self, actor: &Actor) -> Option<Approval> {
        actor.is_manager().then(|| Approval::by_actor(actor))
    }

    /// Self-approval for managers, PIN verification for everyone else.
    pub async fn authorize_unless_manager(
        &self,
        actor: &Actor,
        pin: Option<&str>,
        action: &str,
    ) -> ApiResult<Approval> {
        match self.self_approve(actor) {
            Some(approval) => Ok(approval),
            None => self.authorize(actor, pin, action).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, CollaboratorResult, PinVerification};
    use crate::error::ErrorCode;
    use async_trait::async_trait;
    use bistro_core::StaffRole;

    struct FixedPin;

    #[async_trait]
    impl PinVerifier for FixedPin {
        async fn verify_pin(&self, pin: &str) -> CollaboratorResult<PinVerification> {
            match pin {
                "1234" => Ok(PinVerification::approved("mgr-1", "Manager One")),
                "0000" => Ok(PinVerification {
                    success: true,
                    approver_id: None,
                    approver_name: None,
                }),
                "down" => Err(CollaboratorError::Unavailable {
                    service: "pin",
                    reason: "timeout".into(),
                }),
                _ => Ok(PinVerification::rejected()),
            }
        }
    }

    fn gate() -> ApprovalGate {
        ApprovalGate::new(Arc::new(FixedPin))
    }

    fn server() -> Actor {
        Actor::new("s-1", "Server", StaffRole::Server)
    }

    #[tokio::test]
    async fn test_valid_pin_yields_approver() {
        let approval = gate().authorize(&server(), Some("1234"), "void").await.unwrap();
        assert_eq!(approval.approver_id(), "mgr-1");
        assert_eq!(approval.approver_name(), "Manager One");
    }

    #[tokio::test]
    async fn test_missing_or_wrong_pin_is_unauthorized() {
        for pin in [None, Some(""), Some("9999"), Some("0000")] {
            let err = gate().authorize(&server(), pin, "void").await.unwrap_err();
            assert_eq!(err.code, ErrorCode::Unauthorized, "pin {pin:?}");
        }
    }

    #[tokio::test]
    async fn test_unreachable_verifier_is_operation_failed() {
        let err = gate().authorize(&server(), Some("down"), "void").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OperationFailed);
    }

    #[tokio::test]
    async fn test_manager_self_approval() {
        let manager = Actor::new("m-1", "Boss", StaffRole::Manager);
        let approval = gate()
            .authorize_unless_manager(&manager, None, "discount")
            .await
            .unwrap();
        assert_eq!(approval.approver_id(), "m-1");
        assert!(gate().self_approve(&server()).is_none());
    }
}
