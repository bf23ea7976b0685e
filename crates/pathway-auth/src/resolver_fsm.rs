//! Session resolver state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │   Unresolved    │ (initial)
//!                    └────────┬────────┘
//!     BootstrapAuthenticated  │  BootstrapUnauthenticated
//!     SignedIn                │  SignedOut
//!          ┌──────────────────┴──────────────────┐
//!          ▼                                     ▼
//! ┌─────────────────┐       SignedOut      ┌─────────────────┐
//! │  Authenticated  │ ───────────────────► │ Unauthenticated │
//! │                 │ ◄─────────────────── │                 │
//! └─────────────────┘       SignedIn       └─────────────────┘
//!    ▲          │                              ▲          │
//!    └──────────┘ SignedIn                     └──────────┘ SignedOut
//! ```
//!
//! Bootstrap inputs are only accepted from `Unresolved`: once any event has
//! moved the machine, a late bootstrap result cannot be applied.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub resolver_machine(Unresolved)

    Unresolved => {
        BootstrapAuthenticated => Authenticated,
        BootstrapUnauthenticated => Unauthenticated,
        SignedIn => Authenticated,
        SignedOut => Unauthenticated
    },
    Authenticated => {
        // Different identity, refreshed token, or updated user
        SignedIn => Authenticated,
        SignedOut => Unauthenticated
    },
    Unauthenticated => {
        SignedIn => Authenticated,
        SignedOut => Unauthenticated
    }
}

pub use resolver_machine::Input as ResolverInput;
pub use resolver_machine::State as ResolverPhase;
pub use resolver_machine::StateMachine as ResolverMachine;
