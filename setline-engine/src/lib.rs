//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod config;
pub mod debug;
pub mod delete;
pub mod driver;
pub mod error;
pub mod existence;
pub mod identity;
pub mod parse;
pub mod path;
pub mod recorder;
pub mod render;
pub mod resource;
pub mod schema;
pub mod tree;
pub mod validate;

pub use config::Config;
pub use driver::{Driver, Object, ObjectState};
pub use error::Error;
pub use identity::{Identity, KeySegment};
pub use parse::Parser;
pub use render::render;
pub use resource::Resource;
pub use schema::{Block, Field};
pub use tree::{Node, Value};
pub use validate::{ConstraintViolation, ViolationKind, validate};
