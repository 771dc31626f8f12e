//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod driver;
mod parse;
mod recorder;
mod validate;
