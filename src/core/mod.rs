// SPDX-License-Identifier: MIT

pub mod convert;
pub mod error;
pub mod types;
