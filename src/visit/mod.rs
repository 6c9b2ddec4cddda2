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

//! The visitors which turn dumper events into something useful.

pub mod display;
pub mod has_attachment;
pub mod locate;
pub mod reply;
pub mod saver;
pub mod spam;

use std::collections::HashMap;

use crate::dump::{AttachmentId, IdPrefix, PartEvent};

/// Tracks how the multipart containers of one message nest.
///
/// Only the dumper knows the tree; visitors see a flat stream of events.
/// Every `Multipart` event carries the prefix of its children and its own
/// position, which is enough to rebuild the chain of ancestors of any part.
#[derive(Clone, Debug, Default)]
pub(crate) struct Ancestry {
    /// For each container prefix: the prefix of the enclosing container and
    /// whether the container is `multipart/alternative`.
    containers: HashMap<IdPrefix, (Option<IdPrefix>, bool)>,
}

impl Ancestry {
    pub(crate) fn record(&mut self, event: &PartEvent<'_>) {
        if let PartEvent::Multipart {
            prefix, id, part, ..
        } = *event
        {
            let alternative = part
                .content_type
                .as_ref()
                .map_or(false, |ct| ct.is("multipart", "alternative"));
            self.containers
                .insert(prefix, (id.map(AttachmentId::prefix), alternative));
        }
    }

    /// The prefix of the innermost `multipart/alternative` containing `id`.
    pub(crate) fn alternative_group(
        &self,
        id: AttachmentId,
    ) -> Option<IdPrefix> {
        let mut prefix = Some(id.prefix());
        // Every parent is recorded before its children, so this terminates
        while let Some(p) = prefix {
            match self.containers.get(&p) {
                Some(&(_, true)) => return Some(p),
                Some(&(parent, false)) => prefix = parent,
                None => return None,
            }
        }
        None
    }

    /// Whether `id` lies anywhere under the container with prefix `group`.
    pub(crate) fn is_within(&self, id: AttachmentId, group: IdPrefix) -> bool {
        let mut prefix = Some(id.prefix());
        while let Some(p) = prefix {
            if p == group {
                return true;
            }
            prefix = self.containers.get(&p).and_then(|&(parent, _)| parent);
        }
        false
    }
}
