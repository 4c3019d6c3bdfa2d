// Copyright (c) 2026
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Embeddable tracing runtime.
//!
//! A host application registers named tracepoints and submits opaque byte
//! payloads to them. A background worker thread advertises the runtime's
//! presence over UDP multicast, accepts at most one TCP consumer, and
//! forwards submitted payloads for tracepoints the consumer has enabled.
//!
//! See [`Tracer`](runtime::Tracer) for the entry point.

/// Core protocol primitives: name canonicalization, the tracepoint
/// registry, the submission queue, and the wire codec.
pub mod core;
/// Observability (Prometheus metrics).
pub mod monitoring;
/// Networking stack: UDP beacon announcer, TCP acceptor, consumer session.
pub mod networking;
/// Runtime supervisor: configuration, the `Tracer` handle, lifecycle.
pub mod runtime;

pub use runtime::{Tracer, TracerConfig, TracerInitError};
