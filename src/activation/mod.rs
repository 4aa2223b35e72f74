// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push activation state machine.
//!
//! Activation takes a device from "knows nothing" to "registered with the
//! control plane and receiving pushes", and deactivation takes it back. Each
//! step can fail, the app can be killed between steps, and the application
//! may call `activate` and `deactivate` at any moment. The machine makes
//! this tractable:
//!
//! - [`State`] and [`Event`] are closed enums; [`transition`] is a pure
//!   table lookup returning the next state and the [`Action`]s to run
//! - [`ActivationStateMachine`] runs transitions under one lock, queues
//!   events the current state cannot consume yet, and persists state and
//!   queue through [`ActivationStore`] after every event
//! - [`ActivationContext`] wires the machine to storage, the notification
//!   bus and a registration transport
//!
//! # Lifecycle
//!
//! ```text
//! NotActivated
//!   └─ CalledActivate ─▶ WaitingForPushDeviceDetails
//!        └─ GotPushDeviceDetails ─▶ WaitingForDeviceRegistration
//!             └─ GotDeviceRegistration ─▶ WaitingForNewPushDeviceDetails
//!                  ├─ GotPushDeviceDetails ─▶ WaitingForRegistrationUpdate
//!                  └─ CalledDeactivate ─▶ WaitingForDeregistration
//!                       └─ Deregistered ─▶ NotActivated
//! ```

mod config;
mod context;
mod event;
mod machine;
mod persistence;
mod state;
mod transition;

pub use config::ActivationConfig;
pub use context::{ActivationContext, ActivationContextBuilder};
pub use event::Event;
pub use machine::{ActivationStateMachine, WeakStateMachine};
pub use persistence::ActivationStore;
pub use state::State;
pub use transition::{Action, Transition, resume_actions, transition};
