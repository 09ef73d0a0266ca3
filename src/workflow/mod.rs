//! Workflows: the state machine that drives interactive tasks, and the
//! protocol steps those tasks boil down to.

pub mod protocol;
pub mod task;

pub use protocol::Workflow;
pub use task::{
    Objective, Orchestrator, Outgoing, PreparedSend, RequestAcceptDelegationProps, RequestAttestationProps,
    RequestClaimsForCTypesProps, RequestTermsProps, SubmitClaimsForCTypesProps, SubmitTermsProps, Task,
};
