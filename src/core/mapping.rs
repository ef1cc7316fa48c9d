// file -> slot assignment on a resolved entity
//
//1. compute the slot for the file (image files carry a portion number)
//2. empty slot: write the reference and return
//3. same file already there: rewrite, nothing to arbitrate
//4. other file there: images compare portions, everything else asks the resolver
//
//a failed resolution keeps the occupant; the graph is only written once a winner is known
use thiserror::Error;
use tracing::{info, warn};

use crate::core::collision::{CollisionResolver, ResolveError};
use crate::core::graph::{EntityGraph, GraphError};
use crate::core::slot::{self, SlotError};
use crate::core::types::{EntityRef, FileMetadata, FileRef};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

#[derive(Debug)]
pub enum Assignment {
    Inserted,
    Refreshed,
    Replaced { previous: FileRef },
    Kept { existing: FileRef },
    Unresolved { existing: FileRef, error: ResolveError },
}

impl EntityGraph {
    pub fn assign_file(
        &mut self,
        target: &EntityRef,
        file: &FileRef,
        file_url: &str,
        meta: &FileMetadata,
        resolver: &CollisionResolver<'_>,
    ) -> Result<Assignment, AssignError> {
        let slot = slot::slot_for(meta, &file.filename)?;

        let Some(existing) = self.occupant(target, &slot.base)? else {
            self.set_attribute(target, &slot.base, file, file_url)?;
            return Ok(Assignment::Inserted);
        };

        if existing.file_id == file.file_id {
            self.set_attribute(target, &slot.base, file, file_url)?;
            return Ok(Assignment::Refreshed);
        }

        info!(
            entity = %target,
            slot = %slot.base,
            new = %file,
            existing = %existing,
            "multiple files for same attribute"
        );

        let new_wins = match slot.portion {
            Some(portion) => {
                let present = slot::image_tag(&existing.filename)?.portion;
                if portion == present {
                    warn!(portion, "both images have the same portion, keeping existing file");
                }
                portion > present
            }
            None => match resolver.resolve(meta, file, &existing) {
                Ok(decision) => decision.winner.file_id == file.file_id,
                Err(error) => {
                    warn!(entity = %target, slot = %slot.base, %error, "collision unresolved, keeping existing file");
                    return Ok(Assignment::Unresolved { existing, error });
                }
            },
        };

        if new_wins {
            self.set_attribute(target, &slot.base, file, file_url)?;
            Ok(Assignment::Replaced { previous: existing })
        } else {
            Ok(Assignment::Kept { existing })
        }
    }
}
