//! GCM delivery engine.
//!
//! Sends one notification to a batch of registration ids and reconciles the
//! per-token results, resubmitting tokens the gateway reported as
//! `Unavailable` with jittered exponential backoff until they settle or the
//! retry ceiling is reached.
//!
//! - `request`: validation of inbound requests into a [`DeliveryRequest`]
//! - `gateway`: the [`GatewayClient`] seam and its reqwest implementation
//! - `reconciler`: folds one attempt's results into the running outcome map
//! - `backoff`: retry ceiling and delay computation
//! - `dispatch`: the attempt loop tying it all together

pub mod backoff;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod reconciler;
pub mod request;

pub use dispatch::Dispatcher;
pub use error::{DispatchError, GatewayError};
pub use gateway::{AttemptResult, GatewayClient, HttpGateway};
pub use request::{DeliveryRequest, Limits};
