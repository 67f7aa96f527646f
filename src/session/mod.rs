// ABOUTME: Session layer: per-user conversational state and its state machine
// ABOUTME: Re-exports the store, the machine, and the reply texts
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! Session management: the per-user [`store::SessionStore`] and the
//! [`machine::SessionMachine`] that drives every conversational transition.

pub mod machine;
pub mod replies;
pub mod store;

pub use machine::SessionMachine;
pub use store::SessionStore;
