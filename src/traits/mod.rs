// SPDX-License-Identifier: MIT

mod step;

pub use step::{merge_config, CacheStep, Params, Step};
