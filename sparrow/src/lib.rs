/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub mod client;
pub mod describe;
pub mod error;
pub mod evaluator;
pub mod exec;
pub mod expression;
pub mod graph;
pub mod path;
pub mod results;
pub mod store;
