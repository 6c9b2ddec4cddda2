//-
// Copyright (c) 2020, Jason Lingle
//
// This file is part of Mimedump.
//
// Mimedump is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mimedump is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Mimedump. If not, see <http://www.gnu.org/licenses/>.

//! Walking messages and reporting their structure to visitors.

pub mod classify;
pub mod dumper;
pub mod event;
pub mod id;

pub use self::dumper::{dump, dump_message, open_message};
pub use self::event::{Flow, PartEvent, PartVisitor};
pub use self::id::{AttachmentId, IdPrefix};
