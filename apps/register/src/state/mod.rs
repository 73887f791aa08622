//! # State Module
//!
//! Application state for the register. Created once by the binary and passed
//! by reference to every command; there is no global POS object.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      till_register::run                         │   │
//! │  │  let session = SessionState::new();                             │   │
//! │  │  let config  = ConfigState::from(&register_config);             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │               ┌──────────────┴──────────────┐                           │
//! │               ▼                             ▼                           │
//! │  ┌───────────────────────────┐  ┌──────────────────────────┐            │
//! │  │      SessionState         │  │      ConfigState         │            │
//! │  │                           │  │                          │            │
//! │  │  Arc<Mutex<PosSession>>   │  │  store header/footer     │            │
//! │  │  checkout busy flag       │  │  paper width             │            │
//! │  │  split settlement policy  │  │  currency symbol         │            │
//! │  └───────────────────────────┘  └──────────────────────────┘            │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • SessionState: Arc<Mutex<T>> for exclusive access, AtomicBool guard  │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;

pub use config::ConfigState;
pub use session::{CartResponse, CheckoutGuard, PosSession, SessionState};
