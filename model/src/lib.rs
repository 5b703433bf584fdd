/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

pub mod algebra;
pub mod binding;
pub mod dictionary;
pub mod index;
pub mod node;
pub mod triple;
