//! Scout: a streaming search agent.
//!
//! A user message on a session runs the model/tool control loop until the
//! model answers without tool calls. Progress streams to the caller as SSE
//! frames: an optional `checkpoint`, `content` fragments, `search_results`,
//! and a final `end`.
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use scout::prelude::*;
//!
//! # async fn example() -> scout::error::Result<()> {
//! let config = ScoutConfig::from_env();
//! config.validate()?;
//! let service = ChatService::from_config(&config)?;
//!
//! let mut stream = service.stream_chat("What's the weather in Paris?", None);
//! while let Some(event) = stream.next().await {
//!     print!("{}", String::from_utf8_lossy(&event.to_sse_frame()));
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod provider;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod tools;
pub mod types;
pub mod util;
