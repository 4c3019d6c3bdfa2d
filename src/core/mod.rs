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

//! Core protocol primitives: names, the tracepoint registry, the submission
//! queue, and the canonical wire codec shared by both.

pub mod codec;
pub mod name;
pub mod queue;
pub mod registry;
pub mod types;

pub use name::{canonicalize, NameError, NAME_MAX};
pub use types::{OutboundRecord, SubmissionRecord, SUBMIT_MAX};
